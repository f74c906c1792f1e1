use proptest::prelude::*;
use tablekit_query::escape_like;

fn unescape(escaped: &str) -> String {
	let mut out = String::with_capacity(escaped.len());
	let mut chars = escaped.chars();
	while let Some(c) = chars.next() {
		if c == '\\' {
			if let Some(next) = chars.next() {
				out.push(next);
			}
		} else {
			out.push(c);
		}
	}
	out
}

/// Returns whether every `%` and `_` is preceded by an unescaped `\`
fn wildcards_escaped(escaped: &str) -> bool {
	let mut escaping = false;
	for c in escaped.chars() {
		if escaping {
			escaping = false;
			continue;
		}
		match c {
			'\\' => escaping = true,
			'%' | '_' => return false,
			_ => {}
		}
	}
	!escaping
}

proptest! {
	#[test]
	fn prop_escaped_term_has_no_live_wildcards(term in "[a-z0-9 %_\\\\]{0,16}") {
		let escaped = escape_like(&term);
		prop_assert!(wildcards_escaped(&escaped));
		prop_assert_eq!(unescape(&escaped), term);
	}
}
