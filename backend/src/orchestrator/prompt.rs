//! Prompt composition
//!
//! Builds the final prompt sent to the image and video backends. The
//! function is pure: identical inputs always produce the identical string.

use crate::orchestrator::constants::DOMINANT_COLOR;
use crate::services::templates::TemplateVariant;

/// Compose a generation prompt
///
/// The main and sub copy text are always appended verbatim; when a
/// template is given, its key colors and the dominant color follow.
pub fn compose(
    base: &str,
    main_text: &str,
    sub_text: &str,
    template: Option<&TemplateVariant>,
) -> String {
    let mut prompt = format!(
        "{} Clearly shown Main Text: {}, Sub Text: {}",
        base, main_text, sub_text
    );
    if let Some(template) = template {
        prompt.push_str(&format!(
            " Key Colors: {}  Dominant color: {}",
            template.color, DOMINANT_COLOR
        ));
    }
    prompt
}
