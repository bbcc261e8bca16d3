use super::{HookRegistry, HookValue, MergedHooks};

/// Combines hook registries into one list-valued mapping.
///
/// Registries are applied in iteration order. The first time an event is
/// seen its value seeds a new list; later values for the same event are
/// appended (a list is extended element by element). For any event, hooks
/// therefore appear in the order their registries were supplied, and within
/// a single registry in that registry's own order.
///
/// Inputs are only borrowed. An empty iterator yields an empty mapping.
pub fn merge_hooks<'a, I>(registries: I) -> MergedHooks
where
    I: IntoIterator<Item = &'a HookRegistry>,
{
    let mut merged = MergedHooks::default();

    for registry in registries {
        for (event, value) in registry.iter() {
            match merged.entry(event) {
                Some(existing) => match value {
                    HookValue::Single(hook) => existing.push(hook.clone()),
                    HookValue::Many(hooks) => existing.extend(hooks.iter().cloned()),
                },
                None => merged.insert(event.to_string(), value.hooks().to_vec()),
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Hook;

    fn hook() -> Hook {
        Hook::new(|_| {})
    }

    #[test]
    fn test_merge_empty() {
        let merged = merge_hooks(std::iter::empty::<&HookRegistry>());
        assert!(merged.is_empty());

        let merged = merge_hooks([&HookRegistry::new(), &HookRegistry::new()]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_disjoint_keys_wraps_scalars() {
        let (a, b) = (hook(), hook());
        let first = HookRegistry::new().with("request", a.clone());
        let second = HookRegistry::new().with("response", b.clone());

        let merged = merge_hooks([&first, &second]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("request"), [a].as_slice());
        assert_eq!(merged.get("response"), [b].as_slice());
    }

    #[test]
    fn test_merge_shared_key_scalars_keeps_source_order() {
        let (a, b) = (hook(), hook());
        let first = HookRegistry::new().with("response", a.clone());
        let second = HookRegistry::new().with("response", b.clone());

        let merged = merge_hooks([&first, &second]);
        assert_eq!(merged.get("response"), [a.clone(), b.clone()].as_slice());

        let reversed = merge_hooks([&second, &first]);
        assert_eq!(reversed.get("response"), [b, a].as_slice());
    }

    #[test]
    fn test_merge_list_then_scalar_appends() {
        let (a1, a2, b) = (hook(), hook(), hook());
        let first = HookRegistry::new().with("response", vec![a1.clone(), a2.clone()]);
        let second = HookRegistry::new().with("response", b.clone());

        let merged = merge_hooks([&first, &second]);
        assert_eq!(merged.get("response"), [a1, a2, b].as_slice());
    }

    #[test]
    fn test_merge_scalar_then_list_extends() {
        let (a, b1, b2) = (hook(), hook(), hook());
        let first = HookRegistry::new().with("response", a.clone());
        let second = HookRegistry::new().with("response", vec![b1.clone(), b2.clone()]);

        let merged = merge_hooks([&first, &second]);
        assert_eq!(merged.get("response"), [a, b1, b2].as_slice());
    }

    #[test]
    fn test_merge_three_sources() {
        let (a, b, c) = (hook(), hook(), hook());
        let first = HookRegistry::new().with("response", a.clone());
        let second = HookRegistry::new();
        let third = HookRegistry::new()
            .with("response", vec![b.clone()])
            .with("request", c.clone());

        let merged = merge_hooks([&first, &second, &third]);
        assert_eq!(merged.get("response"), [a, b].as_slice());
        assert_eq!(merged.get("request"), [c].as_slice());
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let (a1, a2, b) = (hook(), hook(), hook());
        let first = HookRegistry::new().with("response", vec![a1, a2]);
        let second = HookRegistry::new().with("response", b);
        let (first_before, second_before) = (first.clone(), second.clone());

        let _ = merge_hooks([&first, &second]);
        let _ = merge_hooks([&first, &second]);

        assert_eq!(first, first_before);
        assert_eq!(second, second_before);
    }

    #[test]
    fn test_merge_empty_list_value_still_yields_key() {
        let a = hook();
        let first = HookRegistry::new().with("response", Vec::<Hook>::new());
        let second = HookRegistry::new().with("response", a.clone());

        let merged = merge_hooks([&first]);
        assert!(merged.contains("response"));
        assert!(merged.get("response").is_empty());

        let merged = merge_hooks([&first, &second]);
        assert_eq!(merged.get("response"), [a].as_slice());
    }
}
