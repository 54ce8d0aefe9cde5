//! DomPage against a real document. Run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use gesture_core::{ActionDispatcher, DispatchOutcome, DomPage, Overflow, Page, ScreenPoint};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn fixed_box(id: &str, style: &str) -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let element: HtmlElement = document.create_element("div").unwrap().dyn_into().unwrap();
    element.set_id(id);
    element.set_attribute("style", style).unwrap();
    document.body().unwrap().append_child(&element).unwrap();
    element
}

#[wasm_bindgen_test]
fn reads_computed_overflow() {
    let scroller = fixed_box(
        "scroller",
        "position:fixed;left:0;top:0;width:200px;height:100px;overflow-y:auto",
    );
    let inner = fixed_box("inner", "height:1000px");
    scroller.append_child(&inner).unwrap();

    let page = DomPage::new().unwrap();
    let metrics = page.scroll_metrics(&scroller);
    assert_eq!(metrics.overflow_y, Overflow::Auto);
    assert!(metrics.is_scroll_container());
    scroller.remove();
}

#[wasm_bindgen_test]
fn click_sequence_reaches_listener() {
    let button = fixed_box(
        "target",
        "position:fixed;left:300px;top:300px;width:80px;height:40px",
    );
    let seen = Rc::new(RefCell::new(Vec::<String>::new()));
    for kind in ["pointerdown", "mousedown", "pointerup", "mouseup", "click"] {
        let seen = seen.clone();
        let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            seen.borrow_mut().push(event.type_());
        });
        button
            .add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref())
            .unwrap();
        listener.forget();
    }

    let mut page = DomPage::new().unwrap();
    let outcome = ActionDispatcher::new().click(&mut page, ScreenPoint::new(320.0, 320.0));
    assert!(matches!(outcome, DispatchOutcome::Clicked { .. }));
    assert_eq!(
        *seen.borrow(),
        vec!["pointerdown", "mousedown", "pointerup", "mouseup", "click"]
    );
    button.remove();
}
