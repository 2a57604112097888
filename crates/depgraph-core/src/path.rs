//! Literal property-path heuristics.
//!
//! Driver and animation paths are only inspected through plain substring
//! matches on a few known prefixes (`pose.bones["`, `modifiers["`, ...).
//! This is deliberately partial: anything the helpers cannot classify is
//! handed on as an unresolved path for a later resolution step.

/// Path prefix addressing a pose bone of an object.
pub const POSE_BONES: &str = "pose.bones[";
/// Path prefix addressing a bone of an armature data-block.
pub const BONES: &str = "bones[";
/// Path prefix addressing a modifier of an object.
pub const MODIFIERS: &str = "modifiers[";
/// Path prefix addressing a block of a shape key.
pub const KEY_BLOCKS: &str = "key_blocks[";

/// Extract the double-quoted string that directly follows the first
/// occurrence of `prefix` in `path`.
///
/// `quoted_substring(r#"pose.bones["hand"].location"#, POSE_BONES)` yields
/// `Some("hand")`. Returns `None` when the prefix is absent, not followed by
/// a quote, or the quote is unterminated.
pub fn quoted_substring<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let start = path.find(prefix)? + prefix.len();
    let rest = path[start..].strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Returns true if `path` mentions `prefix` anywhere.
pub fn mentions(path: &str, prefix: &str) -> bool {
    path.contains(prefix)
}

/// Name of the operation evaluating an F-curve driver: `path[index]`.
pub fn fcurve_id_name(rna_path: &str, array_index: usize) -> String {
    format!("{rna_path}[{array_index}]")
}

/// Path segment addressing the named modifier, `modifiers["<name>"]`.
pub fn modifier_path_pattern(modifier_name: &str) -> String {
    format!("{MODIFIERS}\"{modifier_name}\"]")
}
