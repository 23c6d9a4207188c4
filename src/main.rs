//! PID Minter service entry point.

use pid_minter::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
