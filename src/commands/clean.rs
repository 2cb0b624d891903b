// ABOUTME: Clean command implementation.
// ABOUTME: Empties the staging directory left behind by an interrupted deployment.

use stagehand::config::Config;
use stagehand::error::Result;
use stagehand::output::Output;
use stagehand::staging::Cleaner;

pub async fn clean(config: Config, output: Output) -> Result<()> {
    let cleaner = Cleaner::new(&config.staging.root);
    let removed = cleaner.clean().await?;
    output.success(&format!(
        "Removed {removed} entr{} from {}",
        if removed == 1 { "y" } else { "ies" },
        cleaner.root().display()
    ));
    Ok(())
}
