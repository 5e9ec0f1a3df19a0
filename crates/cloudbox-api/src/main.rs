mod landlock;

use cloudbox_api::setup;
use cloudbox_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // Storage root and guard are created here, before the sandbox locks the tree down
    let (_state, router) = setup::initialize_app(config.clone()).await?;

    // Best-effort Landlock sandboxing on Linux.
    landlock::linux::init(config.storage().root_path());

    setup::server::start_server(&config, router).await?;

    Ok(())
}
