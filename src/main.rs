use anyhow::Context;
use literalura_app::App;
use literalura_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load LiterAlura settings")?;
    literalura_telemetry::init(&settings.telemetry)?;

    App::build(settings).await?.serve().await
}
