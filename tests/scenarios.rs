use parking_lot::Mutex;
use perch::events::{Event, EventHandler, EventKind, ProposedChange, Veto, VetoHandler};
use perch::layout::{AbsoluteLayout, BorderLayout, FlowConstraints, FlowLayout, Region};
use perch::{
    Component, ComponentTree, Config, FocusFallback, LayoutReplacement, RefusalCause, Rect,
    Session, TreeError, Validator, Value,
};
use std::sync::Arc;

#[test]
fn test_validity_settles_with_one_event() {
    let mut tree = ComponentTree::new();
    let form = tree.create_container(Component::new("form"), FlowLayout::default());
    let name = tree.create(
        Component::field("name", "ada").with_validator(Validator::required("name is required")),
    );
    let age = tree.create(
        Component::field("age", 36).with_validator(Validator::range(0., 150., "bad age")),
    );
    tree.add(form, name).unwrap();
    tree.add(form, age).unwrap();
    assert!(tree.component(form).unwrap().is_valid());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    tree.listen(
        form,
        EventKind::Valid,
        EventHandler::new(move |event| sink.lock().push(event.clone())),
    );

    assert!(tree.set_input(age, "ancient").is_err());
    assert!(!tree.component(form).unwrap().is_valid());
    tree.dispatch_events();
    seen.lock().clear();

    tree.set_input(age, 40).unwrap();
    assert!(tree.component(form).unwrap().is_valid());
    tree.dispatch_events();
    assert_eq!(
        *seen.lock(),
        vec![Event::ValidChanged {
            component: form,
            valid: true
        }],
        "exactly one validity change on the container"
    );
    assert_eq!(
        tree.component(age).unwrap().value_state().unwrap().value(),
        &Value::from(40)
    );
}

#[test]
fn test_frame_stack_transfers_focus() {
    let mut tree = ComponentTree::new();
    let f1 = tree.create_frame(Component::new("f1"), FlowLayout::default());
    let f2 = tree.create_frame(Component::new("f2"), FlowLayout::default());

    tree.open(f1, false).unwrap();
    tree.open(f2, false).unwrap();
    assert_eq!(tree.z_order(), &[f1, f2]);
    assert_eq!(tree.focused_frame(), Some(f2));

    tree.close(f2).unwrap();
    assert_eq!(tree.z_order(), &[f1]);
    assert_eq!(tree.focused_frame(), Some(f1));
    let events = tree.drain_events();
    assert!(events.contains(&Event::FrameClosed { frame: f2 }));
    assert!(events.contains(&Event::FocusChanged {
        group: tree.application_frame(),
        old: Some(f2),
        new: Some(f1)
    }));
}

#[test]
fn test_vetoed_focus_keeps_previous() {
    let mut tree = ComponentTree::new();
    let group = tree.create_container(Component::new("form"), FlowLayout::default());
    tree.make_focus_group(group).unwrap();
    let a = tree.create(Component::field("a", ""));
    let b = tree.create(Component::field("b", ""));
    tree.add(group, a).unwrap();
    tree.add(group, b).unwrap();
    tree.set_focused_component(group, Some(a)).unwrap();

    tree.add_veto_listener(
        group,
        VetoHandler::new(|change| match change {
            ProposedChange::Focus { .. } => Err(Veto::new("busy")),
            _ => Ok(()),
        }),
    );
    let err = tree.set_focused_component(group, Some(b)).unwrap_err();
    assert_eq!(err.refusal(), Some(&RefusalCause::Vetoed(Veto::new("busy"))));
    assert_eq!(tree.focused_component(group), Some(a));
    assert!(tree.focus_next(group).unwrap_err().is_refused());
    assert_eq!(tree.focused_component(group), Some(a));
}

#[test]
fn test_vetoed_transfer_falls_through_z_order() {
    let mut tree = ComponentTree::new();
    let app = tree.application_frame();
    let f1 = tree.create_frame(Component::new("f1"), FlowLayout::default());
    let f2 = tree.create_frame(Component::new("f2"), FlowLayout::default());
    let f3 = tree.create_frame(Component::new("f3"), FlowLayout::default());
    tree.open(f1, false).unwrap();
    tree.open(f2, false).unwrap();
    tree.open(f3, false).unwrap();

    tree.add_veto_listener(
        app,
        VetoHandler::new(move |change| match change {
            ProposedChange::Focus {
                proposed: Some(frame),
                ..
            } if *frame == f2 => Err(Veto::new("not f2")),
            _ => Ok(()),
        }),
    );
    tree.close(f3).unwrap();
    assert_eq!(tree.z_order(), &[f1, f2]);
    assert_eq!(tree.focused_frame(), Some(f1), "next frame down takes focus");
}

#[test]
fn test_vetoed_transfer_can_clear_focus() {
    let config = Config::default().focus_fallback(FocusFallback::Clear);
    let mut tree = ComponentTree::with_config(config);
    let app = tree.application_frame();
    let f1 = tree.create_frame(Component::new("f1"), FlowLayout::default());
    let f2 = tree.create_frame(Component::new("f2"), FlowLayout::default());
    tree.open(f1, false).unwrap();
    tree.open(f2, false).unwrap();

    tree.add_veto_listener(
        app,
        VetoHandler::new(|change| match change {
            ProposedChange::Focus {
                proposed: Some(_), ..
            } => Err(Veto::new("no")),
            _ => Ok(()),
        }),
    );
    tree.close(f2).unwrap();
    assert_eq!(tree.focused_frame(), None);
    assert!(tree.is_open(f1));
}

#[test]
fn test_layout_replacement_rederives_constraints() {
    let mut tree = ComponentTree::new();
    let panel = tree.create_container(Component::new("panel"), FlowLayout::default());
    let a = tree.create(Component::new("a"));
    let b = tree.create(Component::new("b"));
    tree.add(panel, a).unwrap();
    tree.add_with(
        panel,
        b,
        FlowConstraints {
            grow: 1.,
            break_before: true,
        },
    )
    .unwrap();
    tree.mark_layout_theme_applied(panel).unwrap();

    let old = tree.set_layout(panel, AbsoluteLayout).unwrap();
    assert_eq!(old.layout_name(), "flow");
    assert!(tree.layout_as::<AbsoluteLayout>(panel).is_some());
    for child in tree.children(panel).iter() {
        assert_eq!(tree.constraints_as::<Rect>(*child), Some(&Rect::zero()));
        assert!(
            tree.constraints_as::<FlowConstraints>(*child).is_none(),
            "no flow constraints survive"
        );
    }
    assert_eq!(tree.layout_theme_applied(panel), Ok(false));

    assert_eq!(
        tree.set_layout(panel, BorderLayout).unwrap_err(),
        TreeError::NoDefaultConstraints { layout: "border" }
    );
    assert!(tree.layout_as::<AbsoluteLayout>(panel).is_some(), "old layout stays");
}

#[test]
fn test_layout_replacement_can_be_forbidden() {
    let config = Config::default().layout_replacement(LayoutReplacement::ForbidWhenPopulated);
    let mut tree = ComponentTree::with_config(config);
    let panel = tree.create_container(Component::new("panel"), BorderLayout);
    let a = tree.create(Component::new("a"));

    tree.set_layout(panel, FlowLayout::default()).unwrap();
    tree.add(panel, a).unwrap();
    assert_eq!(
        tree.set_layout(panel, BorderLayout).unwrap_err(),
        TreeError::LayoutInUse(panel)
    );
    tree.remove(panel, a).unwrap();
    tree.set_layout(panel, BorderLayout).unwrap();
    tree.add_with(panel, a, Region::West).unwrap();
}

#[test]
fn test_destroy_subtree() {
    let mut tree = ComponentTree::new();
    let app = tree.application_frame();
    let panel = tree.create_container(Component::new("panel"), FlowLayout::default());
    let a = tree.create(Component::new("a"));
    tree.add(panel, a).unwrap();
    tree.add(app, panel).unwrap();
    let count = tree.len();

    assert_eq!(tree.destroy(panel), Err(TreeError::StillAttached(panel)));
    assert_eq!(tree.detach(panel), Ok(true));
    tree.destroy(panel).unwrap();
    assert_eq!(tree.len(), count - 2);
    assert!(!tree.contains(a));
    assert_eq!(tree.destroy(app), Err(TreeError::ApplicationFrame("destroyed")));
}

#[test]
fn test_session_poll_delivers_in_order() {
    let session = Session::new(Config::new("main"));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (panel, a) = {
        let mut tree = session.write();
        let sink = Arc::clone(&seen);
        tree.listen_all(
            EventKind::Children,
            EventHandler::new(move |event| sink.lock().push(event.clone())),
        );
        let panel = tree.create_container(Component::new("panel"), FlowLayout::default());
        let a = tree.create(Component::new("a"));
        tree.add(panel, a).unwrap();
        tree.remove(panel, a).unwrap();
        (panel, a)
    };
    {
        let tree = session.read();
        let app = tree.component(tree.application_frame()).unwrap();
        assert_eq!(app.identifier(), "main");
    }

    assert_eq!(session.poll(), 2);
    assert_eq!(
        *seen.lock(),
        vec![
            Event::ChildrenChanged {
                parent: panel,
                index: 0,
                added: Some(a),
                removed: None
            },
            Event::ChildrenChanged {
                parent: panel,
                index: 0,
                added: None,
                removed: Some(a)
            },
        ]
    );
    assert_eq!(session.poll(), 0);
}
