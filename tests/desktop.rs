use cgmath::Point2;
use crossbeam::channel::Sender;
use kite::{
    BitmapHWInterface, ClientRequest, ColorSpace, Desktop, DesktopSettings, HWInterface,
    ServerBitmap, SharedBitmap, Window,
};
use kite_core::{ClipRect, Color, Rect, Region, ViewId};
use std::sync::Arc;

fn desktop() -> (Desktop, SharedBitmap) {
    let bitmap = ServerBitmap::new(200, 150, ColorSpace::Rgb32)
        .unwrap()
        .shared();
    let screen = BitmapHWInterface::new(Arc::clone(&bitmap));
    let settings = DesktopSettings::from_json(
        r#"{ "workspace_count": 2, "border_width": 2, "desktop_color": { "r": 0, "g": 0, "b": 0, "a": 1 } }"#,
    )
    .unwrap();
    (Desktop::new(settings, Arc::new(screen)).unwrap(), bitmap)
}

#[test]
fn overlapping_windows_get_disjoint_regions() {
    let (mut desktop, _) = desktop();
    let back = desktop.create_window("back", Rect::from_xywh(10., 10., 80., 60.), 1);
    let front = desktop.create_window("front", Rect::from_xywh(50., 40., 80., 60.), 1);

    let back_visible = desktop.window(back.window).unwrap().visible_region().clone();
    let front_visible = desktop.window(front.window).unwrap().visible_region().clone();

    assert!((&back_visible & &front_visible).is_empty());
    assert_eq!(front_visible.area(), 84 * 64);
    assert!(!back_visible.contains(60, 50));
    assert!(back_visible.contains(20, 20));

    let mut covered = &back_visible | &front_visible;
    covered.include(desktop.background_region());
    assert_eq!(covered, Region::from_rect(ClipRect::new(0, 0, 200, 150)));
}

#[test]
fn hiding_the_front_window_uncovers_the_back() {
    let (mut desktop, _) = desktop();
    let back = desktop.create_window("back", Rect::from_xywh(10., 10., 80., 60.), 1);
    let front = desktop.create_window("front", Rect::from_xywh(10., 10., 80., 60.), 1);
    assert!(desktop.window(back.window).unwrap().visible_region().is_empty());

    desktop.hide_window(front.window).unwrap();
    assert_eq!(desktop.window(back.window).unwrap().visible_region().area(), 84 * 64);
    assert_eq!(desktop.window_at(Point2::new(20., 20.)), Some(back.window));

    desktop.show_window(front.window).unwrap();
    assert_eq!(desktop.window_at(Point2::new(20., 20.)), Some(front.window));
}

#[test]
fn redraw_paints_background_and_windows() {
    let (mut desktop, bitmap) = desktop();
    let a = desktop.create_window("a", Rect::from_xywh(20., 20., 40., 40.), 1);
    desktop.redraw();
    {
        let bitmap = bitmap.lock();
        assert_eq!(bitmap.pixel(0, 0), Some(Color::BLACK.to_pixel()));
        assert_eq!(bitmap.pixel(30, 30), Some(Color::PANEL.to_pixel()));
        assert_ne!(bitmap.pixel(18, 30), Some(Color::BLACK.to_pixel()));
    }

    let root = desktop.window(a.window).unwrap().root_view();
    let green = Color::new(0., 1., 0., 1.);
    a.requests
        .send(ClientRequest::SetViewColor { id: root, color: green })
        .unwrap();
    a.requests.send(ClientRequest::Redraw).unwrap();
    assert_eq!(desktop.poll(), 2);
    assert_eq!(bitmap.lock().pixel(30, 30), Some(green.to_pixel()));
}

#[test]
fn offscreen_windows_stay_out_of_compositing() {
    let (mut desktop, _) = desktop();
    let bitmap = ServerBitmap::new(10, 10, ColorSpace::Rgba32).unwrap().shared();
    let id = desktop.add_window(Window::offscreen(bitmap, "thumbnail").unwrap(), 1);

    assert!(desktop.all_windows().has_window(desktop.windows(), id));
    assert!(!desktop.workspace_list(0).unwrap().has_window(desktop.windows(), id));
    assert_eq!(desktop.background_region().area(), 200 * 150);
    assert_eq!(desktop.window(id).unwrap().visible_region().area(), 100);
}

#[test]
fn shutdown_closes_everything() {
    let (mut desktop, bitmap) = desktop();
    let a = desktop.create_window("a", Rect::from_xywh(0., 0., 10., 10.), 1);
    desktop.shutdown();
    desktop.shutdown();

    assert!(desktop.window(a.window).unwrap().is_closed());
    assert!(!desktop.screen().is_ready());
    desktop.redraw();
    assert!(bitmap.lock().pixels().iter().all(|&p| p == 0));
}

fn pixels_with(bitmap: &ServerBitmap, pixel: u32) -> Vec<(i32, i32)> {
    let width = bitmap.width() as usize;
    bitmap
        .pixels()
        .iter()
        .enumerate()
        .filter(|(_, &p)| p == pixel)
        .map(|(i, _)| ((i % width) as i32, (i / width) as i32))
        .collect()
}

fn fill_whole_root(requests: &Sender<ClientRequest>, root: ViewId, color: Color) {
    requests
        .send(ClientRequest::SetHighColor { id: root, color })
        .unwrap();
    requests
        .send(ClientRequest::FillRect {
            id: root,
            rect: Rect::from_xywh(0., 0., 200., 200.),
        })
        .unwrap();
}

#[test]
fn drawing_after_a_move_in_the_same_poll_uses_new_clipping() {
    let (mut desktop, bitmap) = desktop();
    let a = desktop.create_window("a", Rect::from_xywh(100., 0., 50., 50.), 1);
    let b = desktop.create_window("b", Rect::from_xywh(0., 0., 50., 50.), 1);
    desktop.activate_window(a.window).unwrap();
    let b_root = desktop.window(b.window).unwrap().root_view();
    let red = Color::new(1., 0., 0., 1.);

    a.requests
        .send(ClientRequest::MoveWindow { dx: -100., dy: 0. })
        .unwrap();
    a.requests.send(ClientRequest::Redraw).unwrap();
    fill_whole_root(&b.requests, b_root, red);
    assert_eq!(desktop.poll(), 4);

    assert!(desktop.window(a.window).unwrap().visible_region().contains(25, 25));
    assert!(desktop.window(b.window).unwrap().visible_region().is_empty());
    let bitmap = bitmap.lock();
    assert_eq!(bitmap.pixel(25, 25), Some(Color::PANEL.to_pixel()));
    assert!(pixels_with(&bitmap, red.to_pixel()).is_empty());
}

#[test]
fn mixed_batch_keeps_drawing_inside_visible_regions() {
    let (mut desktop, bitmap) = desktop();
    let mover = desktop.create_window("mover", Rect::from_xywh(0., 0., 60., 60.), 1);
    let grower = desktop.create_window("grower", Rect::from_xywh(120., 0., 60., 60.), 1);
    let left = desktop.create_window("left", Rect::from_xywh(30., 30., 60., 60.), 1);
    let right = desktop.create_window("right", Rect::from_xywh(100., 70., 80., 60.), 1);
    desktop.activate_window(mover.window).unwrap();
    desktop.activate_window(grower.window).unwrap();

    mover
        .requests
        .send(ClientRequest::MoveWindow { dx: 40., dy: 20. })
        .unwrap();
    mover.requests.send(ClientRequest::Redraw).unwrap();
    grower
        .requests
        .send(ClientRequest::ResizeWindow { dw: 20., dh: 60. })
        .unwrap();
    grower.requests.send(ClientRequest::Redraw).unwrap();

    let fillers = [
        (&left, Color::new(1., 0., 0., 1.)),
        (&right, Color::new(0., 0., 1., 1.)),
    ];
    for (connection, color) in &fillers {
        let root = desktop.window(connection.window).unwrap().root_view();
        fill_whole_root(&connection.requests, root, *color);
    }
    desktop.poll();

    let bitmap = bitmap.lock();
    for (connection, color) in &fillers {
        let visible = desktop.window(connection.window).unwrap().visible_region();
        let drawn = pixels_with(&bitmap, color.to_pixel());
        assert!(!drawn.is_empty());
        for (x, y) in drawn {
            assert!(visible.contains(x, y), "({}, {}) drawn outside", x, y);
        }
    }
}

#[test]
fn far_away_windows_do_not_break_compositing() {
    let (mut desktop, _) = desktop();
    let a = desktop.create_window("a", Rect::from_xywh(0., 0., 50., 50.), 1);
    desktop.move_window(a.window, 3.0e9, 0.).unwrap();
    assert!(desktop.window(a.window).unwrap().visible_region().is_empty());
    assert_eq!(desktop.background_region().area(), 200 * 150);

    a.requests
        .send(ClientRequest::MoveWindow { dx: -6.0e9, dy: -3.0e9 })
        .unwrap();
    a.requests.send(ClientRequest::Redraw).unwrap();
    assert_eq!(desktop.poll(), 2);
    assert!(desktop.window(a.window).unwrap().visible_region().is_empty());
}
