/*!
 * Data Structures
 *
 * Specialized data structures for kernel operations:
 * - Inline strings for process names and short diagnostics
 */

mod inline_string;

pub use inline_string::InlineString;
