use anyhow::Result;
use questlog::cli::{
    actions::{server, Action},
    start,
};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let action = start()?;

    // Handle the action
    match action {
        Action::Server(args) => server::execute(args).await?,
    }

    Ok(())
}
