/// Static, lazily compiled regular expression for internal literals.
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`FnRule`](crate::FnRule) from a condition closure.
///
/// ```
/// use rebulk::{rule, Consequence, Response};
///
/// let drop_short = rule! {
///     name: "drop-short",
///     priority: 10,
///     consequence: [Consequence::RemoveMatch],
///     when: |matches, _context| {
///         let short: Vec<_> = matches.iter().filter(|m| m.len() < 2).cloned().collect();
///         (!short.is_empty()).then(|| Response::Matches(short))
///     },
/// };
/// # let _ = drop_short;
/// ```
#[macro_export]
macro_rules! rule {
    (
        name: $name:expr
        $(, priority: $priority:expr)?
        $(, dependency: [ $($dep:expr),* $(,)? ])?
        $(, consequence: [ $($cons:expr),* $(,)? ])?
        , when: |$matches:ident, $context:ident| $body:block
        $(,)?
    ) => {{
        $crate::FnRule::new(
            $name,
            move |$matches: &$crate::Matches, $context: &$crate::Context| -> Option<$crate::Response> { $body },
        )
        $(.with_priority($priority))?
        $(.with_dependency(vec![ $(::std::string::ToString::to_string(&$dep)),* ]))?
        $(.with_consequences(vec![ $($cons),* ]))?
    }};
}
