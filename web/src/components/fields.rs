//! Form controls shared by the screens.

use leptos::prelude::*;

use crate::cascade::{Choice, Level};
use crate::notice::Notice;

/// `(value, label)` pairs for a `<select>` over `level`.
pub fn options_of<T: Choice>(level: &Level<T>) -> Vec<(String, String)> {
    level
        .options()
        .iter()
        .map(|o| (o.key().to_string(), o.label()))
        .collect()
}

/// The selected key as a `<select>` value, empty when nothing is chosen.
pub fn value_of<T: Choice>(level: &Level<T>) -> String {
    level.selected().map(|k| k.to_string()).unwrap_or_default()
}

/// Labelled text input.
#[component]
pub fn Field(
    label: &'static str,
    #[prop(default = "text")] kind: &'static str,
    value: Signal<String>,
    on_input: Callback<String>,
) -> impl IntoView {
    view! {
        <label class="field">
            <span class="field-label">{label}</span>
            <input
                type=kind
                placeholder=label
                prop:value=move || value.get()
                on:input=move |ev| on_input.run(event_target_value(&ev))
            />
        </label>
    }
}

/// Labelled `<select>` with an empty placeholder entry.
#[component]
pub fn Picker(
    label: &'static str,
    placeholder: &'static str,
    options: Signal<Vec<(String, String)>>,
    selected: Signal<String>,
    disabled: Signal<bool>,
    on_pick: Callback<String>,
) -> impl IntoView {
    view! {
        <label class="field">
            <span class="field-label">{label}</span>
            <select
                disabled=move || disabled.get()
                prop:value=move || selected.get()
                on:change=move |ev| on_pick.run(event_target_value(&ev))
            >
                <option value="">{placeholder}</option>
                {move || {
                    let current = selected.get();
                    options
                        .get()
                        .into_iter()
                        .map(|(value, label)| {
                            let chosen = value == current;
                            view! { <option value=value selected=chosen>{label}</option> }
                        })
                        .collect_view()
                }}
            </select>
        </label>
    }
}

/// Error or success line of a page.
#[component]
pub fn NoticeBanner(notice: Signal<Notice>) -> impl IntoView {
    move || {
        let notice = notice.get();
        match (notice.error(), notice.success()) {
            (Some(error), _) => Some(
                view! { <div class="alert alert-error">{error.to_string()}</div> }.into_any(),
            ),
            (None, Some(success)) => Some(
                view! { <div class="alert alert-success">{success.to_string()}</div> }.into_any(),
            ),
            (None, None) => None,
        }
    }
}
