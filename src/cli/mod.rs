mod args;
mod paths;

pub use args::{Cli, Commands, ConfigArgs};
pub use paths::{
    default_properties_file, feature_catalog_file, resolve_base_dir, resolve_data_dir,
    user_properties_file,
};
