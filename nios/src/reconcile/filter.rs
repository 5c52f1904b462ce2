//! Inheritance filtering: separating what the user declared from what the
//! remote system filled in on its own.

use super::attributes::{AttributeMap, TaggedValue};
use super::tag::CORRELATION_TAG_KEY;

/// Result of [`split`]: `explicit` is what gets diffed against configuration,
/// `full` is the annotated snapshot persisted for the next update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAttributes {
    pub explicit: AttributeMap,
    pub full: AttributeMap,
}

/// Annotates every observed attribute as explicit or inherited.
///
/// A key is explicit when the user declared it, or when it is the
/// correlation tag and its non-empty value equals `stored_tag`. Everything
/// else is inherited. Values always come from `observed`.
pub fn split(
    declared: &AttributeMap,
    observed: &AttributeMap,
    stored_tag: Option<&str>,
) -> SplitAttributes {
    let full: AttributeMap = observed
        .iter()
        .map(|(key, observed_value)| {
            let value = observed_value.value.clone();
            let is_explicit =
                declared.contains_key(key) || is_stored_tag(key, &value, stored_tag);
            let tagged = if is_explicit {
                TaggedValue::explicit(value)
            } else {
                TaggedValue::inherited(value)
            };
            (key.clone(), tagged)
        })
        .collect();

    SplitAttributes {
        explicit: full.explicit(),
        full,
    }
}

fn is_stored_tag(key: &str, value: &str, stored_tag: Option<&str>) -> bool {
    key == CORRELATION_TAG_KEY && !value.is_empty() && stored_tag == Some(value)
}

/// Builds the attribute map to submit on update: everything the user wants,
/// plus every previously inherited attribute the user did not override.
/// Without the re-injection the remote system would drop inherited values on
/// receiving a partial map.
pub fn merge_inherited(user: &AttributeMap, full: &AttributeMap) -> AttributeMap {
    let mut submitted = user.clone();
    for (key, value) in full.iter().filter(|(_, v)| v.inherited) {
        if !submitted.contains_key(key) {
            submitted.insert(key.clone(), value.clone());
        }
    }
    submitted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(pairs: &[(&str, &str)]) -> AttributeMap {
        AttributeMap::from_values(pairs.iter().copied())
    }

    fn assert_partition(declared: &AttributeMap, seen: &AttributeMap, split: &SplitAttributes) {
        let inherited = split.full.inherited();
        let explicit_keys: Vec<_> = split.explicit.keys().collect();
        let inherited_keys: Vec<_> = inherited.keys().collect();

        assert_eq!(split.full.len(), split.explicit.len() + inherited.len());
        assert!(explicit_keys.iter().all(|k| !inherited.contains_key(k)));
        assert!(inherited_keys.iter().all(|k| !split.explicit.contains_key(k)));
        assert!(split.explicit.keys().all(|k| seen.contains_key(k)));
        for key in declared.keys().filter(|k| seen.contains_key(k)) {
            assert!(!split.full.get(key).unwrap().inherited, "{} should be explicit", key);
        }
    }

    #[test]
    fn remote_defaults_are_marked_inherited() {
        let declared = AttributeMap::from_values([("Site", "NYC")]);
        let seen = observed(&[("Site", "NYC"), ("Region", "US-East")]);

        let split = split(&declared, &seen, None);

        assert_eq!(split.explicit, AttributeMap::from_values([("Site", "NYC")]));
        assert_eq!(
            split.full.get("Region"),
            Some(&TaggedValue::inherited("US-East"))
        );
        assert_eq!(split.full.get("Site"), Some(&TaggedValue::explicit("NYC")));
        assert_partition(&declared, &seen, &split);
    }

    #[test]
    fn values_come_from_the_remote_side() {
        let declared = AttributeMap::from_values([("Site", "NYC")]);
        let seen = observed(&[("Site", "nyc")]);

        let split = split(&declared, &seen, None);
        assert_eq!(split.explicit.value("Site"), Some("nyc"));
    }

    #[test]
    fn declared_keys_missing_remotely_are_dropped() {
        let declared = AttributeMap::from_values([("Site", "NYC"), ("Owner", "netops")]);
        let seen = observed(&[("Site", "NYC")]);

        let split = split(&declared, &seen, None);
        assert!(!split.explicit.contains_key("Owner"));
        assert_partition(&declared, &seen, &split);
    }

    #[test]
    fn stored_tag_is_explicit_even_when_undeclared() {
        let seen = observed(&[(CORRELATION_TAG_KEY, "abc-uuid"), ("Region", "US-East")]);

        let split = split(&AttributeMap::new(), &seen, Some("abc-uuid"));

        assert_eq!(
            split.explicit,
            AttributeMap::from_values([(CORRELATION_TAG_KEY, "abc-uuid")])
        );
        assert!(split.full.get("Region").unwrap().inherited);
    }

    #[test]
    fn foreign_tag_is_inherited() {
        let seen = observed(&[(CORRELATION_TAG_KEY, "someone-else")]);

        let split = split(&AttributeMap::new(), &seen, Some("abc-uuid"));
        assert!(split.explicit.is_empty());
        assert!(split.full.get(CORRELATION_TAG_KEY).unwrap().inherited);
    }

    #[test]
    fn empty_tag_never_matches() {
        let seen = observed(&[(CORRELATION_TAG_KEY, "")]);

        let split = split(&AttributeMap::new(), &seen, Some(""));
        assert!(split.explicit.is_empty());
    }

    #[test]
    fn splitting_an_already_split_pair_is_a_no_op() {
        let declared = AttributeMap::from_values([("Site", "NYC"), (CORRELATION_TAG_KEY, "t-1")]);
        let seen = observed(&[
            ("Site", "NYC"),
            ("Region", "US-East"),
            (CORRELATION_TAG_KEY, "t-1"),
        ]);

        let first = split(&declared, &seen, Some("t-1"));
        let second = split(&first.explicit, &first.full, Some("t-1"));

        assert_eq!(second.explicit, first.explicit);
        assert_eq!(second.full, first.full);
    }

    #[test]
    fn split_is_deterministic() {
        let declared = AttributeMap::from_values([("Site", "NYC")]);
        let seen = observed(&[("Site", "NYC"), ("Region", "US-East"), ("Zone", "b")]);

        assert_eq!(split(&declared, &seen, None), split(&declared, &seen, None));
    }

    #[test]
    fn update_keeps_inherited_attributes() {
        let declared = AttributeMap::from_values([("Site", "NYC")]);
        let seen = observed(&[("Site", "NYC"), ("Region", "US-East")]);
        let full = split(&declared, &seen, None).full;

        let submitted = merge_inherited(&AttributeMap::from_values([("Site", "LA")]), &full);

        assert_eq!(submitted.value("Site"), Some("LA"));
        assert_eq!(submitted.value("Region"), Some("US-East"));
        assert_eq!(submitted.len(), 2);
    }

    #[test]
    fn user_value_overrides_inherited_one() {
        let mut full = AttributeMap::new();
        full.insert("Region", TaggedValue::inherited("US-East"));

        let submitted = merge_inherited(&AttributeMap::from_values([("Region", "EU")]), &full);
        assert_eq!(submitted.get("Region"), Some(&TaggedValue::explicit("EU")));
    }

    #[test]
    fn removed_explicit_attribute_is_not_reinjected() {
        let full = AttributeMap::from_values([("Owner", "netops")]);

        let submitted = merge_inherited(&AttributeMap::new(), &full);
        assert!(submitted.is_empty());
    }
}
