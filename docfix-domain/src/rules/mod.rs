use crate::rule::Rule;
use std::sync::Arc;

mod content_type;
mod entity_reference;
mod flag_only;

pub use content_type::ContentTypeRule;
pub use entity_reference::EntityReferenceRule;
pub use flag_only::FlagOnlyRule;

const CONTENT_TYPE: &[&str] = &[ContentTypeRule::NAME];

/// The static registration list. Order matters: it is the tie-break for
/// dependency ordering and the scan order for fallback resolution.
pub fn builtin_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(EntityReferenceRule),
        Arc::new(ContentTypeRule),
        Arc::new(FlagOnlyRule::new("ShortDescription")),
        Arc::new(FlagOnlyRule::new("BlockTitle")),
        Arc::new(FlagOnlyRule::new("DocumentId")),
        Arc::new(FlagOnlyRule::new("CrossReference")),
        Arc::new(FlagOnlyRule::new("TaskSection").with_dependencies(CONTENT_TYPE)),
        Arc::new(FlagOnlyRule::new("TaskStep").with_dependencies(CONTENT_TYPE)),
        Arc::new(FlagOnlyRule::new("TaskTitle").with_dependencies(CONTENT_TYPE)),
        Arc::new(FlagOnlyRule::new("TaskContents").with_dependencies(CONTENT_TYPE)),
        Arc::new(FlagOnlyRule::new("TaskExample").with_dependencies(CONTENT_TYPE)),
    ]
}
