//! Default pipeline stages.
//!
//! 1. **LoadStage** - Validate the input path and read its bytes
//! 2. **MarkdownStage** - Convert markdown to an HTML fragment
//! 3. **TemplateStage** - Wrap the fragment in the page template
//! 4. **WriteStage** - Write the page next to the input

mod load;
mod markdown;
mod template;
mod write;

pub use load::LoadStage;
pub use markdown::MarkdownStage;
pub use template::TemplateStage;
pub use write::WriteStage;
