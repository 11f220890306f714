//! Configuration module

mod site;

pub use site::CmsConfig;
pub use site::CmsKind;
pub use site::CommentsConfig;
pub use site::PreviewConfig;
pub use site::SiteConfig;
pub use site::ACCESS_TOKEN_ENV;
