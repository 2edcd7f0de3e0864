use perch::events::Event;
use perch::layout::{BorderLayout, FlowConstraints, FlowLayout, Region};
use perch::store::{
    ChildStore, EnumIndexedArray, FixedPositionalArray, KeyedComponentMap, OrderedChildList,
    ValueKeyedStateMap,
};
use perch::{Component, ComponentId, ComponentTree, TreeError};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Leading,
    Trailing,
}
perch::impl_slot_key!(Side { Leading, Trailing });

type Rows = ValueKeyedStateMap<u32, bool>;

fn assert_member(tree: &ComponentTree, owner: ComponentId, child: ComponentId) {
    assert_eq!(tree.parent(child), Some(owner), "child should point at its owner");
    assert!(
        tree.children(owner).contains(&child),
        "owner should list the child"
    );
}

fn assert_detached(tree: &ComponentTree, owner: ComponentId, child: ComponentId) {
    assert_eq!(tree.parent(child), None, "child should have no parent");
    assert!(
        !tree.children(owner).contains(&child),
        "owner should not list the child"
    );
}

#[test]
fn test_every_store_keeps_parent_links() {
    let mut tree = ComponentTree::new();
    let list = tree.create_composite(Component::new("list"), OrderedChildList::new());
    let array = tree.create_composite(Component::new("array"), FixedPositionalArray::new(3));
    let sides = tree.create_composite(Component::new("sides"), EnumIndexedArray::<Side>::new());
    let keyed = tree.create_composite(Component::new("keyed"), KeyedComponentMap::new());
    let rows = tree.create_composite(Component::new("rows"), Rows::new());

    let a = tree.create(Component::new("a"));
    tree.add_child(list, a).unwrap();
    assert_member(&tree, list, a);
    tree.remove_child(list, a).unwrap();
    assert_detached(&tree, list, a);

    tree.set_slot(array, 2, Some(a)).unwrap();
    assert_member(&tree, array, a);
    assert_eq!(tree.slot(array, 2), Ok(Some(a)));
    tree.set_slot(array, 2, None).unwrap();
    assert_detached(&tree, array, a);

    tree.set_key_slot(sides, Side::Trailing, Some(a)).unwrap();
    assert_member(&tree, sides, a);
    assert_eq!(tree.key_slot(sides, Side::Leading), Ok(None));
    tree.set_key_slot(sides, Side::Trailing, None).unwrap();
    assert_detached(&tree, sides, a);

    tree.insert_keyed(keyed, a).unwrap();
    assert_member(&tree, keyed, a);
    assert_eq!(tree.keyed(keyed, "a"), Ok(Some(a)));
    assert_eq!(tree.remove_keyed(keyed, "a"), Ok(Some(a)));
    assert_detached(&tree, keyed, a);

    tree.put_state(rows, 7u32, a, true).unwrap();
    assert_member(&tree, rows, a);
    let row = tree.state::<u32, bool>(rows, &7).unwrap().unwrap();
    assert_eq!(row.component(), a);
    assert!(row.state);
    tree.remove_state::<u32, bool>(rows, &7).unwrap();
    assert_detached(&tree, rows, a);
}

#[test]
fn test_component_is_in_at_most_one_store() {
    let mut tree = ComponentTree::new();
    let first = tree.create_composite(Component::new("first"), OrderedChildList::new());
    let second = tree.create_composite(Component::new("second"), KeyedComponentMap::new());
    let panel = tree.create_container(Component::new("panel"), FlowLayout::default());
    let a = tree.create(Component::new("a"));

    tree.add_child(first, a).unwrap();
    assert_eq!(
        tree.insert_keyed(second, a),
        Err(TreeError::AlreadyParented {
            child: a,
            parent: first
        })
    );
    assert_eq!(
        tree.add(panel, a),
        Err(TreeError::AlreadyParented {
            child: a,
            parent: first
        })
    );
    assert!(tree.children(second).is_empty());
    assert!(tree.children(panel).is_empty());
    assert!(tree.constraints_of(a).is_none(), "no constraints outside a container");

    tree.detach(a).unwrap();
    tree.insert_keyed(second, a).unwrap();
    assert_eq!(tree.parent(a), Some(second));
    assert!(tree.children(first).is_empty());
}

#[test]
fn test_adding_twice_is_a_no_op() {
    let mut tree = ComponentTree::new();
    let list = tree.create_composite(Component::new("list"), OrderedChildList::new());
    let array = tree.create_composite(Component::new("array"), FixedPositionalArray::new(2));
    let panel = tree.create_container(Component::new("panel"), FlowLayout::default());
    let a = tree.create(Component::new("a"));
    let b = tree.create(Component::new("b"));
    let c = tree.create(Component::new("c"));

    assert_eq!(tree.add_child(list, a), Ok(true));
    assert_eq!(tree.set_slot(array, 0, Some(b)), Ok(None));
    assert_eq!(tree.add(panel, c), Ok(true));
    tree.drain_events();

    assert_eq!(tree.add_child(list, a), Ok(false));
    assert_eq!(tree.set_slot(array, 0, Some(b)), Ok(Some(b)));
    assert_eq!(tree.add(panel, c), Ok(false));
    assert_eq!(tree.children(list).len(), 1);
    assert_eq!(tree.children(array).len(), 1);
    assert_eq!(tree.children(panel).len(), 1);
    assert!(tree.drain_events().is_empty(), "repeated adds queue nothing");
}

#[test]
fn test_duplicate_key_leaves_map_unchanged() {
    let mut tree = ComponentTree::new();
    let keyed = tree.create_composite(Component::new("keyed"), KeyedComponentMap::new());
    let first = tree.create(Component::new("x"));
    let second = tree.create(Component::new("x"));
    tree.insert_keyed(keyed, first).unwrap();
    tree.drain_events();

    assert_eq!(
        tree.insert_keyed(keyed, second),
        Err(TreeError::DuplicateIdentifier {
            identifier: "x".to_string(),
            existing: first
        })
    );
    assert_eq!(tree.keyed(keyed, "x"), Ok(Some(first)));
    assert_eq!(tree.parent(second), None);
    assert_eq!(*tree.children(keyed), vec![first]);
    assert!(tree.drain_events().is_empty());
}

#[test]
fn test_container_round_trip() {
    let mut tree = ComponentTree::new();
    let panel = tree.create_container(Component::new("panel"), BorderLayout);
    let center = tree.create(Component::new("center"));
    let south = tree.create(Component::new("south"));
    tree.add_with(panel, center, Region::Center).unwrap();
    let before = tree.children(panel);

    tree.add_with(panel, south, Region::South).unwrap();
    assert_eq!(tree.constraints_as::<Region>(south), Some(&Region::South));
    tree.remove(panel, south).unwrap();

    assert_eq!(tree.children(panel), before);
    assert_eq!(tree.constraints_as::<Region>(center), Some(&Region::Center));
    assert!(tree.constraints_of(south).is_none());
    assert_eq!(tree.parent(south), None);
}

#[test]
fn test_border_layout_needs_constraints() {
    let mut tree = ComponentTree::new();
    let panel = tree.create_container(Component::new("panel"), BorderLayout);
    let a = tree.create(Component::new("a"));

    assert_eq!(
        tree.add(panel, a),
        Err(TreeError::NoDefaultConstraints { layout: "border" })
    );
    assert!(
        tree.add_with(panel, a, FlowConstraints::default()).is_err(),
        "flow constraints don’t fit a border layout"
    );
    assert_eq!(tree.parent(a), None, "failed adds leave the child alone");
    assert!(!tree.has_children(panel));
}

#[test]
fn test_store_events_report_removals_first() {
    let mut tree = ComponentTree::new();
    let array = tree.create_composite(Component::new("array"), FixedPositionalArray::new(1));
    let a = tree.create(Component::new("a"));
    let b = tree.create(Component::new("b"));
    tree.set_slot(array, 0, Some(a)).unwrap();
    tree.drain_events();

    assert_eq!(tree.set_slot(array, 0, Some(b)), Ok(Some(a)));
    assert_eq!(
        tree.drain_events(),
        vec![
            Event::ChildrenChanged {
                parent: array,
                index: 0,
                added: None,
                removed: Some(a)
            },
            Event::ChildrenChanged {
                parent: array,
                index: 0,
                added: Some(b),
                removed: None
            },
        ]
    );
    assert_eq!(tree.parent(a), None);
}

#[test]
fn test_value_keyed_map_requires_a_key() {
    let mut tree = ComponentTree::new();
    let rows = tree.create_composite(Component::new("rows"), Rows::new());
    let a = tree.create(Component::new("a"));
    let b = tree.create(Component::new("b"));

    assert_eq!(
        tree.add_child(rows, a),
        Err(TreeError::KeyRequired {
            store: "value-keyed map"
        })
    );
    tree.put_state(rows, 1u32, a, false).unwrap();
    tree.put_state(rows, 2u32, b, false).unwrap();
    assert_eq!(tree.store::<Rows>(rows).map(|store| store.len()), Ok(2));

    tree.clear_states::<u32, bool>(rows).unwrap();
    assert!(!tree.has_children(rows));
    assert_eq!(tree.parent(a), None);
    assert_eq!(tree.parent(b), None);
}

#[test]
fn test_with_store_checks_the_store_type() {
    let mut tree = ComponentTree::new();
    let list = tree.create_composite(Component::new("list"), OrderedChildList::new());
    let a = tree.create(Component::new("a"));

    let result = tree.with_store(list, |store: &mut KeyedComponentMap, cx| store.add(cx, a));
    assert!(matches!(result, Err(TreeError::WrongStore { owner, .. }) if owner == list));

    let inserted = tree.with_store(list, |store: &mut OrderedChildList, cx| {
        store.insert(cx, 0, a)
    });
    assert_eq!(inserted, Ok(true));
    assert_eq!(tree.parent(a), Some(list));
}
