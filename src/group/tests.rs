//! Scenario tests: the whole grouping engine driven end to end against the
//! simulated window server, on a paused clock so the deliberate delays cost
//! nothing.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::task::LocalSet;

use crate::common::config::Config;
use crate::common::geometry::Rect;
use crate::group::events::TabEvent;
use crate::group::properties::{
    LOADING_TAB_TITLE, MemoryPropertyStore, PropertyStore, TabProperties, TabPropertiesDelta,
};
use crate::group::{BoundsPolicy, GroupError, TabGroup};
use crate::model::Desktop;
use crate::sys::simulation::{SimControl, SimServer};
use crate::sys::window_server::{ServerEvent, WindowSpec};
use crate::window::{DisplayState, PropertyDelta, TransformMask, WindowEntity, WindowIdentity};

struct Harness {
    desktop: Rc<Desktop>,
    control: SimControl,
    store: Rc<MemoryPropertyStore>,
    destroyed: Rc<Cell<usize>>,
    created: Rc<Cell<usize>>,
}

fn harness() -> Harness {
    let (server, handle, control) = SimServer::new();
    tokio::task::spawn_local(server.run());

    let store = Rc::new(MemoryPropertyStore::new());
    let desktop = Desktop::new(Config::default(), handle, store.clone());

    let created = Rc::new(Cell::new(0));
    let c = created.clone();
    desktop.signals.group_created.subscribe(move |_| c.set(c.get() + 1));
    let destroyed = Rc::new(Cell::new(0));
    let d = destroyed.clone();
    desktop.signals.group_destroyed.subscribe(move |_| d.set(d.get() + 1));

    Harness {
        desktop,
        control,
        store,
        destroyed,
        created,
    }
}

impl Harness {
    async fn window(&self, name: &str, frame: Rect) -> Rc<WindowEntity> {
        self.desktop
            .create_window(WindowSpec {
                identity: WindowIdentity::new("app", name),
                frame,
                frame_decorated: true,
                hidden: false,
                title: name.to_string(),
            })
            .await
            .unwrap()
    }

    async fn grouped_pair(&self) -> (Rc<TabGroup>, Rc<WindowEntity>, Rc<WindowEntity>) {
        let w1 = self.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
        let w2 = self.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;
        let group = self.desktop.create_tab_group().await.unwrap();
        group.add_tabs(&[w1.clone(), w2.clone()], None).await.unwrap();
        (group, w1, w2)
    }

    fn delivered_kinds(&self, window: &WindowEntity, kind: &str) -> usize {
        self.control
            .delivered(window.id())
            .iter()
            .filter(|e| e.kind() == kind)
            .count()
    }
}

fn assert_combined_bounds(group: &TabGroup) {
    let bounds = group.bounds().expect("group has members");
    let strip = group.strip().frame();
    let active = group.active_tab().expect("group has an active tab").frame();
    assert_eq!(bounds.width(), strip.width());
    assert_eq!(strip.width(), active.width());
    assert_eq!(bounds.height(), strip.height() + active.height());
    assert_eq!(bounds.top(), strip.top());
    assert_eq!(strip.bottom(), active.top());
}

macro_rules! scenario {
    ($(#[$meta:meta])* $name:ident, $body:expr) => {
        #[test_log::test(tokio::test(start_paused = true))]
        $(#[$meta])*
        async fn $name() {
            LocalSet::new().run_until(async { $body }).await;
        }
    };
}

scenario!(membership_grows_with_each_add, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let w2 = h.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;

    let group = h.desktop.create_tab_group().await.unwrap();
    for w in [&w1, &w2, &w3] {
        group.add_tab(w).await.unwrap();
    }

    assert_eq!(group.member_count(), 3);
    for w in [&w1, &w2, &w3] {
        assert_eq!(w.tab_group(), Some(group.id()));
        assert!(group.strip().snap_group().contains(w.id()));
    }
    let visible: Vec<_> =
        group.members().into_iter().filter(|m| !m.current_state().hidden).collect();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id(), group.active_tab().unwrap().id());
    assert_eq!(visible[0].id(), w3.id());
    assert_combined_bounds(&group);
});

scenario!(combined_bounds_hold_after_every_mutation, {
    let h = harness();
    let (group, w1, w2) = h.grouped_pair().await;
    assert_combined_bounds(&group);

    group.switch_tab(&w2).await.unwrap();
    assert_combined_bounds(&group);

    group.maximize().await.unwrap();
    assert_combined_bounds(&group);

    group.restore().await.unwrap();
    assert_combined_bounds(&group);

    let w3 = h.window("w3", Rect::from_extent(600.0, 300.0, 400.0, 300.0)).await;
    group.add_tab(&w3).await.unwrap();
    assert_combined_bounds(&group);

    group.remove_tab(&w3, BoundsPolicy::Restore).await.unwrap();
    assert_combined_bounds(&group);
    let _ = w1;
});

scenario!(combining_two_windows_anchors_strip_over_the_first, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let w2 = h.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;
    let bystander = h.window("bystander", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;
    let bystander_frame = bystander.frame();

    let group = h.desktop.create_tab_group().await.unwrap();
    group.add_tabs(&[w1.clone(), w2.clone()], Some(w2.id())).await.unwrap();

    let strip = group.strip().frame();
    assert_eq!(strip.half_size.x, 100.0);
    assert_eq!(strip.top(), 0.0);
    assert_eq!(w2.frame().top(), 60.0);
    assert_eq!(group.active_tab().unwrap().id(), w2.id());

    // a window that was never passed in stays independent
    assert!(!group.is_member(bystander.id()));
    assert_eq!(bystander.tab_group(), None);
    assert_eq!(bystander.frame(), bystander_frame);

    assert_eq!(h.created.get(), 1);
});

scenario!(batch_active_id_wins_regardless_of_insertion_order, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let w2 = h.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;

    let group = h.desktop.create_tab_group().await.unwrap();
    group
        .add_tabs(&[w1.clone(), w2.clone(), w3.clone()], Some(w3.id()))
        .await
        .unwrap();

    assert_eq!(group.active_tab().unwrap().id(), w3.id());
    assert!(!w3.current_state().hidden);
    assert!(w1.current_state().hidden);
    assert!(w2.current_state().hidden);
});

scenario!(batch_without_switch_resends_activation_for_the_first, {
    let h = harness();
    let (group, w1, _w2) = h.grouped_pair().await;

    assert_eq!(group.active_tab().unwrap().id(), w1.id());
    // one from first-tab activation, one synthetic resend
    assert_eq!(h.delivered_kinds(&w1, "tab-activated"), 2);
    assert_eq!(h.delivered_kinds(group.strip(), "tab-activated"), 2);
});

scenario!(unchanged_policy_only_unhides, {
    let h = harness();
    let (group, _w1, w2) = h.grouped_pair().await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;
    group.add_tab(&w3).await.unwrap();

    // w2 is hidden and parked on the grouped bounds
    let before = w2.current_state();
    assert!(before.hidden);

    group.remove_tab(&w2, BoundsPolicy::Unchanged).await.unwrap();

    let after = w2.current_state();
    assert_eq!(after.frame, before.frame);
    assert!(!after.hidden);
    assert!(after.frame_decorated);
    assert_eq!(w2.tab_group(), None);
    assert_eq!(w2.snap_group().windows(), vec![w2.id()]);
});

scenario!(default_policy_returns_the_strip_space, {
    let h = harness();
    let (group, _w1, w2) = h.grouped_pair().await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;
    group.add_tab(&w3).await.unwrap();

    let before = w2.frame();
    group.remove_tab(&w2, BoundsPolicy::Restore).await.unwrap();
    let after = w2.frame();

    assert_eq!(after.half_size.y, before.half_size.y + 30.0);
    assert_eq!(after.center.y, before.center.y - 30.0);
    assert_eq!(after.half_size.x, before.half_size.x);
});

scenario!(override_policy_places_the_window_exactly, {
    let h = harness();
    let (group, _w1, w2) = h.grouped_pair().await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;
    group.add_tab(&w3).await.unwrap();

    let target = Rect::from_extent(50.0, 70.0, 480.0, 360.0);
    group.remove_tab(&w2, BoundsPolicy::Override(target)).await.unwrap();
    assert_eq!(w2.frame(), target);
    assert!(!w2.current_state().hidden);
});

scenario!(removing_the_active_member_promotes_by_index, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let w2 = h.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;
    let w4 = h.window("w4", Rect::from_extent(900.0, 0.0, 200.0, 200.0)).await;
    let group = h.desktop.create_tab_group().await.unwrap();
    group
        .add_tabs(&[w1.clone(), w2.clone(), w3.clone(), w4.clone()], Some(w2.id()))
        .await
        .unwrap();

    // w2 sits at index 1; the member now occupying that index takes over
    group.remove_tab(&w2, BoundsPolicy::Restore).await.unwrap();
    assert_eq!(group.active_tab().unwrap().id(), w3.id());
    assert!(!w3.current_state().hidden);

    // removing the last-positioned active falls back to the preceding index
    group.switch_tab(&w4).await.unwrap();
    group.remove_tab(&w4, BoundsPolicy::Restore).await.unwrap();
    assert_eq!(group.active_tab().unwrap().id(), w3.id());
    assert_eq!(h.destroyed.get(), 0);
    let _ = w1;
});

scenario!(reorder_accepts_exactly_a_permutation, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let w2 = h.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;
    let group = h.desktop.create_tab_group().await.unwrap();
    group.add_tabs(&[w1.clone(), w2.clone(), w3.clone()], None).await.unwrap();

    let id = |w: &Rc<WindowEntity>| w.identity().clone();

    group.reorder_tabs(&[id(&w3), id(&w1), id(&w2)]).unwrap();
    let order: Vec<_> = group.members().iter().map(|m| m.id()).collect();
    assert_eq!(order, vec![w3.id(), w1.id(), w2.id()]);

    let foreign = WindowIdentity::new("app", "stranger");
    for bad in [
        vec![id(&w1), id(&w2)],                    // missing
        vec![id(&w1), id(&w2), id(&w2)],           // duplicated
        vec![id(&w1), id(&w2), foreign.clone()],   // unresolved
    ] {
        let err = group.reorder_tabs(&bad).unwrap_err();
        assert!(matches!(err, GroupError::InvalidOrder));
        let unchanged: Vec<_> = group.members().iter().map(|m| m.id()).collect();
        assert_eq!(unchanged, vec![w3.id(), w1.id(), w2.id()]);
    }
});

scenario!(swap_replaces_in_place, {
    let h = harness();
    let (group, w1, w2) = h.grouped_pair().await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;

    // swapping out a hidden member leaves the replacement hidden too
    group.swap_tab(&w2, &w3).await.unwrap();
    let order: Vec<_> = group.members().iter().map(|m| m.id()).collect();
    assert_eq!(order, vec![w1.id(), w3.id()]);
    assert!(w3.current_state().hidden);
    assert_eq!(w2.tab_group(), None);
    assert!(w2.current_state().hidden, "swapped-out window is not unhidden");

    // swapping out the active member promotes the replacement
    let w4 = h.window("w4", Rect::from_extent(600.0, 300.0, 200.0, 200.0)).await;
    group.swap_tab(&w1, &w4).await.unwrap();
    assert_eq!(group.active_tab().unwrap().id(), w4.id());
    assert!(!w4.current_state().hidden);

    let stranger = h.window("stranger", Rect::from_extent(0.0, 600.0, 100.0, 100.0)).await;
    let w5 = h.window("w5", Rect::from_extent(0.0, 800.0, 100.0, 100.0)).await;
    let err = group.swap_tab(&stranger, &w5).await.unwrap_err();
    assert!(matches!(err, GroupError::NotAMember(_)));
});

scenario!(switch_is_a_noop_for_the_active_tab, {
    let h = harness();
    let (group, w1, _w2) = h.grouped_pair().await;

    let before = h.delivered_kinds(&w1, "tab-activated");
    group.switch_tab(&w1).await.unwrap();
    assert_eq!(h.delivered_kinds(&w1, "tab-activated"), before);
});

scenario!(switch_hides_previous_and_raises_next, {
    let h = harness();
    let (group, w1, w2) = h.grouped_pair().await;

    group.switch_tab(&w2).await.unwrap();
    assert!(w1.current_state().hidden);
    assert!(!w2.current_state().hidden);
    assert_eq!(h.control.frontmost(), Some(w2.id()));
    assert_eq!(h.delivered_kinds(&w2, "tab-activated"), 1);
    assert_eq!(group.active_tab().unwrap().id(), w2.id());
});

scenario!(switch_waits_for_render_only_when_bounds_differ, {
    let h = harness();
    let (group, _w1, w2) = h.grouped_pair().await;

    // identical bounds: immediate
    let start = tokio::time::Instant::now();
    group.switch_tab(&w2).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(100));

    // drift the hidden member's bounds, then switch back
    let w1 = group.members()[0].clone();
    w1.apply_properties(PropertyDelta::bounds(Rect::from_extent(10.0, 10.0, 180.0, 180.0)))
        .await
        .unwrap();
    let start = tokio::time::Instant::now();
    group.switch_tab(&w1).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(100));
});

scenario!(resync_failures_do_not_fail_the_switch, {
    let h = harness();
    let (group, _w1, w2) = h.grouped_pair().await;

    h.control.fail_next(w2.id(), "sync");
    group.switch_tab(&w2).await.unwrap();
    assert_eq!(group.active_tab().unwrap().id(), w2.id());
});

scenario!(fan_out_failure_propagates_without_rollback, {
    let h = harness();
    let (group, _w1, _w2) = h.grouped_pair().await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;

    // the strip leg of the join notification fan-out fails; the member leg
    // already landed and stays landed
    h.control.fail_next(group.strip().id(), "deliver");
    let err = group.add_tab(&w3).await.unwrap_err();
    assert!(matches!(err, GroupError::Server(_)));
    assert_eq!(h.delivered_kinds(&w3, "join-tab-group"), 1);
    assert!(group.is_member(w3.id()), "committed membership is not rolled back");
});

scenario!(batch_insertion_is_serialized_against_the_same_windows, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let w2 = h.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;

    let tx = h.desktop.transactions.acquire(&[w1.id()]).await;
    let group = h.desktop.create_tab_group().await.unwrap();

    let task = {
        let group = group.clone();
        let windows = vec![w1.clone(), w2.clone()];
        tokio::task::spawn_local(async move { group.add_tabs(&windows, None).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!task.is_finished(), "batch must wait for the held window");
    assert_eq!(group.member_count(), 0);

    drop(tx);
    task.await.unwrap().unwrap();
    assert_eq!(group.member_count(), 2);
});

scenario!(add_tab_at_inserts_at_the_position, {
    let h = harness();
    let (group, w1, w2) = h.grouped_pair().await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;

    group.add_tab_at(&w3, 0).await.unwrap();

    let order: Vec<_> = group.members().iter().map(|m| m.id()).collect();
    assert_eq!(order, vec![w3.id(), w1.id(), w2.id()]);
    assert_eq!(group.active_tab().unwrap().id(), w3.id());
    assert_eq!(w3.frame(), w1.frame());
});

scenario!(adding_an_existing_member_is_a_noop, {
    let h = harness();
    let (group, w1, _w2) = h.grouped_pair().await;

    let joins = h.delivered_kinds(&w1, "join-tab-group");
    group.add_tab(&w1).await.unwrap();
    assert_eq!(group.member_count(), 2);
    assert_eq!(h.delivered_kinds(&w1, "join-tab-group"), joins);
});

scenario!(cross_group_move_pulls_the_window_over, {
    let h = harness();
    let (group_a, _a1, _a2) = h.grouped_pair().await;
    let b1 = h.window("b1", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;
    let b2 = h.window("b2", Rect::from_extent(600.0, 300.0, 200.0, 200.0)).await;
    let group_b = h.desktop.create_tab_group().await.unwrap();
    group_b.add_tabs(&[b1.clone(), b2.clone()], None).await.unwrap();
    assert_eq!(h.desktop.group_count(), 2);

    // b1 leaves a two-member group, so that group disbands behind the move
    group_a.add_tab(&b1).await.unwrap();

    assert_eq!(b1.tab_group(), Some(group_a.id()));
    assert_eq!(group_a.member_count(), 3);
    assert_eq!(h.desktop.group_count(), 1);
    assert_eq!(h.destroyed.get(), 1);
    assert_eq!(b2.tab_group(), None);
});

scenario!(maximize_then_restore_round_trips_exactly, {
    let h = harness();
    let (group, w1, _w2) = h.grouped_pair().await;
    let before_member = w1.frame();
    let before_strip = group.strip().frame();

    group.maximize().await.unwrap();
    assert!(group.is_maximized());
    let screen = h.desktop.screen();
    assert_eq!(group.strip().frame().width(), screen.width());
    assert_eq!(group.strip().frame().top(), 0.0);
    assert_eq!(w1.frame().top(), 60.0);
    assert_eq!(w1.frame().bottom(), screen.bottom());

    group.restore().await.unwrap();
    assert!(!group.is_maximized());
    assert_eq!(w1.frame(), before_member);
    assert_eq!(group.strip().frame(), before_strip);

    // a second restore with nothing to do is a no-op
    group.restore().await.unwrap();
    assert_eq!(w1.frame(), before_member);
});

scenario!(minimize_touches_only_strip_and_active, {
    let h = harness();
    let (group, w1, w2) = h.grouped_pair().await;

    group.minimize().await.unwrap();
    assert_eq!(group.strip().current_state().display, DisplayState::Minimized);
    assert_eq!(w1.current_state().display, DisplayState::Minimized);
    assert_eq!(w2.current_state().display, DisplayState::Normal);

    group.restore().await.unwrap();
    assert_eq!(group.strip().current_state().display, DisplayState::Normal);
    assert_eq!(w1.current_state().display, DisplayState::Normal);
    assert_eq!(w2.current_state().display, DisplayState::Normal);
});

scenario!(restoring_a_minimized_maximized_group_normalizes_first, {
    let h = harness();
    let (group, w1, _w2) = h.grouped_pair().await;

    group.maximize().await.unwrap();
    let maximized_frame = w1.frame();
    group.minimize().await.unwrap();

    // first restore only normalizes display states; the split stays
    group.restore().await.unwrap();
    assert!(group.is_maximized());
    assert_eq!(w1.current_state().display, DisplayState::Normal);
    assert_eq!(w1.frame(), maximized_frame);

    // second restore undoes the maximize itself
    group.restore().await.unwrap();
    assert!(!group.is_maximized());
});

scenario!(user_transform_invalidates_the_maximize_cache, {
    let h = harness();
    let (group, w1, _w2) = h.grouped_pair().await;
    group.maximize().await.unwrap();

    h.desktop.handle_event(ServerEvent::Transformed {
        id: w1.id(),
        frame: Rect::from_extent(5.0, 90.0, 400.0, 300.0),
        mask: TransformMask::MOVE,
    });
    assert!(!group.is_maximized());
});

scenario!(disband_closes_the_strip_once_and_restores_the_survivor, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let w2 = h.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;
    let group = h.desktop.create_tab_group().await.unwrap();
    group.add_tabs(&[w1.clone(), w2.clone()], None).await.unwrap();
    let strip = group.strip().clone();

    group.remove_tab(&w2, BoundsPolicy::Restore).await.unwrap();

    assert_eq!(h.destroyed.get(), 1);
    assert_eq!(h.desktop.group_count(), 0);
    // the anchor member gets its pre-grouping footprint back
    assert_eq!(w1.frame(), Rect::from_extent(0.0, 0.0, 200.0, 200.0));
    assert_eq!(w1.tab_group(), None);
    assert!(!w1.current_state().hidden);
    // strip went back to the pool: alive, hidden, reused by the next group
    assert!(strip.is_alive());
    assert!(strip.current_state().hidden);
    let next = h.desktop.create_tab_group().await.unwrap();
    assert!(Rc::ptr_eq(next.strip(), &strip));

    // removing the second-to-last member already ejected the survivor;
    // nothing further happens on a stale handle
    let err = group.add_tab(&w1).await.unwrap_err();
    assert!(matches!(err, GroupError::Destroyed));
});

scenario!(disband_reattaches_the_survivor_to_its_old_partner, {
    let h = harness();
    let (group, w1, w2) = h.grouped_pair().await;
    let partner = h.window("partner", Rect::from_extent(900.0, 0.0, 200.0, 200.0)).await;

    // the snapping engine glued the whole group to another window
    partner.set_snap_group(group.strip().snap_group());

    group.remove_tab(&w2, BoundsPolicy::Restore).await.unwrap();

    assert!(Rc::ptr_eq(&w1.snap_group(), &partner.snap_group()));
    assert!(w1.snap_group().contains(partner.id()));
    // the other ejected member keeps its fresh singleton group
    assert_eq!(w2.snap_group().windows(), vec![w2.id()]);
});

scenario!(teardown_driven_removal_skips_the_dead_window, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let w2 = h.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;
    let w3 = h.window("w3", Rect::from_extent(600.0, 0.0, 200.0, 200.0)).await;
    let group = h.desktop.create_tab_group().await.unwrap();
    group.add_tabs(&[w1.clone(), w2.clone(), w3.clone()], None).await.unwrap();

    // the user closes the active member out from under us
    h.desktop.handle_event(ServerEvent::Closed { id: w1.id() });
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(group.member_count(), 2);
    assert!(!group.is_member(w1.id()));
    assert_eq!(group.active_tab().unwrap().id(), w2.id());
    assert!(!w2.current_state().hidden);
    assert_eq!(h.desktop.get_id(w1.identity()), None);
});

scenario!(close_all_disbands_through_teardown, {
    let h = harness();
    let (group, w1, w2) = h.grouped_pair().await;

    group.close_all().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(h.destroyed.get(), 1);
    assert_eq!(h.desktop.group_count(), 0);
    assert!(h.control.window_state(w1.id()).is_none());
    assert!(h.control.window_state(w2.id()).is_none());
});

scenario!(remove_all_without_closing_keeps_the_windows, {
    let h = harness();
    let (group, w1, w2) = h.grouped_pair().await;

    group.remove_all_tabs(false).await.unwrap();

    assert_eq!(h.destroyed.get(), 1);
    assert!(w1.is_alive() && w2.is_alive());
    assert!(!w1.current_state().hidden);
    assert!(!w2.current_state().hidden);
    assert_eq!(w1.tab_group(), None);
    assert_eq!(w2.tab_group(), None);
});

scenario!(placeholder_titles_render_as_the_loading_label, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let loading = h
        .desktop
        .create_window(WindowSpec {
            identity: WindowIdentity::new("app", "restoring"),
            frame: Rect::from_extent(300.0, 0.0, 200.0, 200.0),
            frame_decorated: true,
            hidden: false,
            title: "wm-restore-placeholder-7".to_string(),
        })
        .await
        .unwrap();

    let group = h.desktop.create_tab_group().await.unwrap();
    group.add_tabs(&[w1.clone(), loading.clone()], None).await.unwrap();

    assert_eq!(group.tab_properties(loading.id()).unwrap().title, LOADING_TAB_TITLE);
    assert_eq!(group.tab_properties(w1.id()).unwrap().title, "w1");
});

scenario!(persisted_properties_beat_derived_ones, {
    let h = harness();
    let w1 = h.window("w1", Rect::from_extent(0.0, 0.0, 200.0, 200.0)).await;
    let w2 = h.window("w2", Rect::from_extent(300.0, 0.0, 200.0, 200.0)).await;
    h.store.write(
        w2.identity(),
        &TabProperties {
            icon: "saved.png".into(),
            title: "Saved".into(),
        },
    );

    let group = h.desktop.create_tab_group().await.unwrap();
    group.add_tabs(&[w1.clone(), w2.clone()], None).await.unwrap();

    assert_eq!(group.tab_properties(w2.id()).unwrap().title, "Saved");
    let joins = h.control.delivered(w2.id());
    let TabEvent::JoinTabGroup { display_properties, .. } = &joins[0] else {
        panic!("expected a join notification first, got {joins:?}");
    };
    assert_eq!(display_properties.title, "Saved");
});

scenario!(property_updates_write_through_and_notify, {
    let h = harness();
    let (group, w1, _w2) = h.grouped_pair().await;

    group
        .update_tab_properties(
            &w1,
            TabPropertiesDelta {
                title: Some("Renamed".into()),
                icon: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(group.tab_properties(w1.id()).unwrap().title, "Renamed");
    assert_eq!(h.store.read(w1.identity()).unwrap().title, "Renamed");
    assert_eq!(h.delivered_kinds(&w1, "tab-properties-updated"), 1);
    assert_eq!(h.delivered_kinds(group.strip(), "tab-properties-updated"), 1);
});

scenario!(join_notifications_reach_member_and_strip, {
    let h = harness();
    let (group, w1, w2) = h.grouped_pair().await;

    for w in [&w1, &w2] {
        assert_eq!(h.delivered_kinds(w, "join-tab-group"), 1);
    }
    assert_eq!(h.delivered_kinds(group.strip(), "join-tab-group"), 2);

    group.remove_tab(&w2, BoundsPolicy::Restore).await.unwrap();
    assert_eq!(h.delivered_kinds(&w2, "leave-tab-group"), 1);
    // strip saw w2 leave and then w1 leave during the disband
    assert_eq!(h.delivered_kinds(group.strip(), "leave-tab-group"), 2);
});
