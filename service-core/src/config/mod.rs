use config::{Config as Cfg, ConfigBuilder, File, builder::DefaultState};

/// Builder shared by every service: `.env`, an optional `configuration` file,
/// then `APP__*` environment variables. Services add their own defaults on top.
pub fn base_builder() -> ConfigBuilder<DefaultState> {
    dotenvy::dotenv().ok();

    Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
}
