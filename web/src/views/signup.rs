//! `/signup`

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos_router::components::A;

use crate::app::Route as Screen;
use crate::components::fields::{Field, NoticeBanner};
use crate::pages::signup::{SignupPage, REGISTERED_MESSAGE};
use crate::views::{act, notice_of, Ui};

#[component]
pub fn SignupView() -> impl IntoView {
    let ui = expect_context::<Ui>();
    let page = RwSignal::new(SignupPage::default());

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        act(&ui, page, |mut p, app| async move {
            p.submit(&app).await;
            p
        });
    };

    let form = move || {
        view! {
            <h1>"Create an Account"</h1>
            <form on:submit=submit.clone()>
                <Field
                    label="Username"
                    value=Signal::derive(move || page.with(|p| p.username.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.username = v))
                />
                <Field
                    label="Email Address"
                    kind="email"
                    value=Signal::derive(move || page.with(|p| p.email.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.email = v))
                />
                <Field
                    label="Password"
                    kind="password"
                    value=Signal::derive(move || page.with(|p| p.password.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.password = v))
                />
                <NoticeBanner notice=notice_of(page)/>
                <button type="submit">"Sign Up"</button>
            </form>
            <p>"Already have an account? " <A href=Screen::Login.path()>"Login"</A></p>
        }
    };

    view! {
        <section class="page auth-page">
            <Show when=move || page.with(|p| p.registered) fallback=form>
                <h1>"Registration Successful!"</h1>
                <p>{REGISTERED_MESSAGE}</p>
                <A href=Screen::Login.path()>"Go to Login"</A>
            </Show>
        </section>
    }
}
