//! Scenario tests for Collection.

#[cfg(test)]
mod tests {
    use crate::codec::{Format, SKIPPED_OBJECT};
    use crate::collection::Collection;
    use crate::container::{ErrorRecord, Options};
    use crate::rules::{Check, TransformRules, ValidationRules};
    use crate::value::{Object, Value};
    use pretty_assertions::assert_eq;

    /// Helper to build string values.
    fn values(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    fn nine() -> Collection {
        let mut collection = Collection::from_values(values(&[
            "0", "1", "2", "3", "4", "5", "6", "7", "8",
        ]));
        collection.set_page_size(2);
        collection
    }

    #[test]
    fn test_paging() {
        let mut c = nine();
        assert_eq!(c.count(), 9);
        assert_eq!(c.count_pages(), 5);
        assert_eq!(c.current_page(), 1);

        assert_eq!(c.get_first_page(), Some(values(&["0", "1"])));
        assert_eq!(c.get_page(3), Some(values(&["4", "5"])));
        assert_eq!(c.get_last_page(), Some(values(&["8"])));
        assert_eq!(c.get_page(0), None);
        assert_eq!(c.get_page(10), None);

        assert!(c.next_page());
        assert_eq!(c.current_page(), 2);
        assert_eq!(c.get_current_page(), Some(values(&["2", "3"])));
        assert_eq!(c.get_next_page(), Some(values(&["4", "5"])));
        assert_eq!(c.get_previous_page(), Some(values(&["0", "1"])));
        assert_eq!(c.current_page(), 2);

        assert!(c.previous_page());
        assert!(!c.previous_page());
        assert_eq!(c.current_page(), 1);
        assert_eq!(c.get_previous_page(), None);
    }

    #[test]
    fn test_partial_last_page_is_not_stepped_onto() {
        let mut c = nine();
        while c.next_page() {}
        assert_eq!(c.current_page(), 4);
        assert_eq!(c.get_next_page(), None);
        assert_eq!(c.count_pages(), 5);
        assert_eq!(c.get_page(5), Some(values(&["8"])));
    }

    #[test]
    fn test_page_lengths() {
        for (count, size) in [(9_usize, 2_usize), (8, 2), (10, 3), (1, 4)] {
            let items: Vec<Value> = (0..count).map(|i| Value::Int(i as i64)).collect();
            let mut c = Collection::from_values(items);
            c.set_page_size(size);
            let pages = c.count_pages();
            for page in 1..pages {
                assert_eq!(c.get_page(page).map(|p| p.len()), Some(size));
            }
            let tail = if count % size == 0 { size } else { count % size };
            assert_eq!(c.get_page(pages).map(|p| p.len()), Some(tail));
        }
    }

    #[test]
    fn test_zero_page_size() {
        let mut c = nine();
        c.set_page_size(0);
        assert_eq!(c.page_size(), 1);
        assert_eq!(c.count_pages(), 9);
    }

    #[test]
    fn test_delete_reindexes() {
        let mut c = Collection::from_values(values(&["a", "b", "c", "d"]));
        c.delete(1);

        assert_eq!(c.count(), 3);
        assert_eq!(c.elements(), values(&["a", "c", "d"]));
        assert_eq!(c.get_element(1), Some(Value::from("c")));
        assert!(c.has_element(2));
        assert!(!c.has_element(3));
        assert!(c.data_changed());
        assert_eq!(c.original_collection(), values(&["a", "b", "c", "d"]));

        c.delete(7);
        assert_eq!(c.count(), 3);
    }

    #[test]
    fn test_new_indices_shift_on_delete() {
        let mut c = Collection::from_values(values(&["a", "b"]));
        c.add_element("c").add_element("d");
        assert_eq!(c.new_indices(), vec![2, 3]);

        c.delete(0);
        assert_eq!(c.new_indices(), vec![1, 2]);

        c.delete(1);
        assert_eq!(c.new_indices(), vec![1]);
        assert_eq!(c.elements(), values(&["b", "d"]));
        assert_eq!(c.original_collection(), values(&["a", "b"]));
    }

    #[test]
    fn test_change_and_restore() {
        let mut c = Collection::from_values(values(&["a", "b", "c"]));
        c.change_element(1, "x")
            .change_element(1, "y")
            .delete(0)
            .add_element("z")
            .change_element(2, "new z");

        assert_eq!(c.elements(), values(&["y", "c", "new z"]));
        assert_eq!(c.original_collection(), values(&["a", "b", "c"]));

        c.restore();
        assert_eq!(c.elements(), values(&["a", "b", "c"]));
        assert!(!c.data_changed());
        assert!(c.new_indices().is_empty());
    }

    #[test]
    fn test_change_out_of_range_and_noop() {
        let mut c = Collection::from_values(values(&["a"]));
        c.change_element(5, "x").change_element(0, "a");
        assert!(!c.data_changed());
        assert_eq!(c.elements(), values(&["a"]));
    }

    #[test]
    fn test_change_with_transform() {
        let mut c = Collection::from_values(vec![1.into(), 2.into()]);
        c.change_element_with(1, 10, |index, value, collection| {
            let current = collection.get_element(index).and_then(|v| v.as_int());
            match (current, value.as_int()) {
                (Some(a), Some(b)) => Value::Int(a + b),
                _ => value,
            }
        });
        assert_eq!(c.get_element(1), Some(Value::Int(12)));
        assert_eq!(c.original_collection(), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_replace_baseline() {
        let mut c = Collection::from_values(values(&["a", "b"]));
        c.delete(0).add_element("c");
        c.replace_baseline();
        assert!(!c.data_changed());
        assert_eq!(c.original_collection(), values(&["b", "c"]));

        c.change_element(0, "q");
        c.restore();
        assert_eq!(c.elements(), values(&["b", "c"]));
    }

    #[test]
    fn test_validation_and_preparation() {
        let mut validation = ValidationRules::new();
        validation.add(".*", Check::pattern("^[a-z]+$").unwrap()).unwrap();
        let mut preparation = TransformRules::new();
        preparation
            .add_fn(".*", |_, v| match v {
                Value::String(s) => Value::String(s.to_uppercase()),
                other => other,
            })
            .unwrap();

        let mut c = Collection::with_options(
            Options::new()
                .data(values(&["keep"]), Format::Array)
                .validation(validation)
                .preparation(preparation),
        );
        assert_eq!(c.first(), Some(Value::from("keep")));

        c.add_element("ok").add_element("NO").add_element("x1");
        assert_eq!(c.elements(), values(&["keep", "OK"]));
        assert_eq!(c.errors().len(), 2);
        assert_eq!(
            c.error(0),
            Some(&ErrorRecord::ValidationMismatch {
                key: "2".into(),
                data: "NO".into(),
                rule: "^[a-z]+$".into(),
            })
        );

        c.change_element(0, "BAD");
        assert_eq!(c.first(), Some(Value::from("keep")));

        c.stop_validation().stop_preparation().add_element("RAW");
        assert_eq!(c.last(), Some(Value::from("RAW")));
    }

    #[test]
    fn test_retrieve_rules() {
        let mut c = Collection::from_values(values(&["a", "b"]));
        c.retrieve_rules_mut()
            .add_fn(".*", |_, v| match v {
                Value::String(s) => Value::String(format!("<{s}>")),
                other => other,
            })
            .unwrap();
        assert_eq!(c.first(), Some(Value::from("<a>")));
        assert_eq!(c.last(), Some(Value::from("<b>")));
        assert_eq!(c.get_page(1), Some(values(&["<a>", "<b>"])));

        c.stop_retrieve();
        assert_eq!(c.get_element(0), Some(Value::from("a")));
    }

    #[test]
    fn test_json() {
        let mut c = Collection::from_json(r#"["a", 1, null]"#);
        assert_eq!(c.count(), 3);
        assert_eq!(c.to_json().as_deref(), Some(r#"["a",1,null]"#));

        let bad = Collection::from_json("[oops");
        assert!(bad.has_errors());
        assert!(bad.is_empty());
    }

    #[test]
    fn test_serialize_round_trip() {
        let object = Object::new("Widget", Default::default());
        let mut c = Collection::from_values(vec!["a".into(), object.clone().into()]);

        let text = c.serialize(false).unwrap();
        let back = Collection::from_serialized(&text);
        assert_eq!(back.elements(), c.elements());

        let skipped = c.serialize(true).unwrap();
        let back = Collection::from_serialized(&skipped);
        assert_eq!(back.get_element(1), Some(Value::from(SKIPPED_OBJECT)));
    }

    #[test]
    fn test_unserialize() {
        let mut source = Collection::from_values(values(&["x", "y"]));
        let text = source.serialize(false).unwrap();

        let mut c = Collection::from_values(values(&["a"]));
        c.unserialize(&text);
        assert_eq!(c.elements(), values(&["x", "y"]));
        assert_eq!(c.original_collection(), values(&["a"]));
        assert_eq!(c.new_indices(), vec![0, 1]);
    }

    #[test]
    fn test_to_string() {
        let mut c = Collection::with_options(
            Options::new()
                .data(vec![Value::from("a"), 2.into()], Format::Array)
                .separator("/"),
        );
        assert_eq!(c.to_text().as_deref(), Some("a/2"));
        assert_eq!(c.to_string_with(" ").as_deref(), Some("a 2"));

        c.add_element(Value::List(vec![]));
        assert_eq!(c.to_text(), None);
        assert_eq!(
            c.errors().last(),
            Some(&ErrorRecord::NotFlattenable { key: "2".into() })
        );
    }

    #[test]
    fn test_iterate() {
        let c = Collection::from_values(values(&["a", "b"]));
        let pairs: Vec<_> = c.iterate().collect();
        assert_eq!(pairs, vec![(0_usize, Value::from("a")), (1_usize, Value::from("b"))]);
        assert_eq!(c.iterate().count(), 2);
    }

    #[test]
    fn test_append_list() {
        let mut c = Collection::new();
        c.append_list(values(&["a", "b"]));
        assert_eq!(c.count(), 2);
        assert_eq!(c.new_indices(), vec![0, 1]);
        assert!(c.original_collection().is_empty());
    }

    #[test]
    fn test_xml_input_keeps_document_order() {
        let items: String = (0..12)
            .map(|i| format!("<integer_key_{i}>{i}</integer_key_{i}>"))
            .collect();
        let xml = format!("<root>{items}</root>");
        let mut c = Collection::with_options(Options::new().data(xml, Format::Xml));
        assert!(!c.has_errors());

        let expected: Vec<Value> = (0..12).map(|i: i32| Value::String(i.to_string())).collect();
        assert_eq!(c.elements(), expected);

        c.set_page_size(5);
        assert_eq!(c.get_page(3), Some(values(&["10", "11"])));
    }

    #[test]
    fn test_json_object_input_keeps_key_order() {
        let c = Collection::from_json(r#"{"z": 1, "a": 2, "m": 3}"#);
        assert_eq!(c.elements(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_huge_page_size() {
        let mut c = Collection::from_values(values(&["only"]));
        c.set_page_size(usize::MAX);
        assert_eq!(c.count_pages(), 1);
        assert!(!c.next_page());
        assert_eq!(c.get_next_page(), None);
        assert_eq!(c.get_first_page(), Some(values(&["only"])));
    }
}
