pub mod builder;
pub mod cli;
pub mod error;
pub mod merge;
pub mod metadata;
pub mod resolver;
pub mod writer;

pub use builder::{ExtensionPackage, PackageBuilder};
pub use metadata::{DirectiveMapping, DirectiveValue};
pub use resolver::{Asset, AssetResolver, HttpAssetResolver};
