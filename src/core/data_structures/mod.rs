/*!
 * Data Structures
 *
 * Small value types shared by the signal and messaging subsystems:
 * - Inline strings for message kinds and panic reasons
 */

mod inline_string;

pub use inline_string::InlineString;
