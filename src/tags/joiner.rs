/// Separator between tags in the joined string.
pub const SEPARATOR: &str = ", ";

/// Joins tags with [`SEPARATOR`] while staying within `max_len` characters.
///
/// Tags are taken in order. When the next tag would push the string past
/// `max_len`, it is still taken if fewer than `mandatory_count` tags have been
/// accepted so far; otherwise joining stops and the remaining tags are
/// dropped. Mandatory tags therefore always survive, even when that makes the
/// result longer than `max_len`.
///
/// # Examples
///
/// ```
/// use matchtags::tags::join_within_limit;
///
/// let tags = ["boca", "river", "superclasico"];
/// assert_eq!(join_within_limit(&tags, 11, 0), "boca, river");
/// assert_eq!(join_within_limit(&tags, 3, 2), "boca, river");
/// ```
pub fn join_within_limit<S: AsRef<str>>(tags: &[S], max_len: usize, mandatory_count: usize) -> String {
    let mut acc = String::new();
    let mut acc_len = 0;
    let mut accepted = 0;

    for tag in tags {
        let tag = tag.as_ref();
        let sep_len = if accepted == 0 { 0 } else { SEPARATOR.len() };
        let add_len = sep_len + tag.chars().count();

        if acc_len + add_len > max_len && accepted >= mandatory_count {
            break;
        }

        if accepted > 0 {
            acc.push_str(SEPARATOR);
        }
        acc.push_str(tag);
        acc_len += add_len;
        accepted += 1;
    }

    acc
}
