//! Built-in pipeline stages.

pub mod css;
pub mod forward;
pub mod html;
pub mod sink;

pub use self::css::{CssContext, CssResolverStage, DEFAULT_CSS};
pub use self::forward::ForwardingStage;
pub use self::html::{HtmlContext, HtmlStage, LinkTable};
pub use self::sink::{DocumentBuilder, DocumentSinkStage, ElementCollector, SinkContext};
