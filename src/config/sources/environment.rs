//! Environment source: LESSONFORGE__SECTION__KEY, e.g. LESSONFORGE__PROVIDER__API_KEY.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("LESSONFORGE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
