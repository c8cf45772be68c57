//! `/login`

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::{Redirect, A};

use crate::app::Route as Screen;
use crate::components::fields::{Field, NoticeBanner};
use crate::pages::login::LoginPage;
use crate::views::{notice_of, Ui};

#[component]
pub fn LoginView() -> impl IntoView {
    let ui = expect_context::<Ui>();
    let page = RwSignal::new(LoginPage::default());
    let next = RwSignal::new(None::<Screen>);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let ui = ui.clone();
        let mut draft = page.get_untracked();
        spawn_local(async move {
            let target = draft.submit(&ui.app).await;
            page.set(draft);
            ui.sync();
            next.set(target);
        });
    };

    view! {
        <section class="page auth-page">
            <h1>"Welcome Back!"</h1>
            <p>"Login to access the paper archive"</p>
            <form on:submit=submit>
                <Field
                    label="Username"
                    value=Signal::derive(move || page.with(|p| p.username.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.username = v))
                />
                <Field
                    label="Password"
                    kind="password"
                    value=Signal::derive(move || page.with(|p| p.password.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.password = v))
                />
                <NoticeBanner notice=notice_of(page)/>
                <button type="submit">"Login"</button>
            </form>
            <p>"Don't have an account? " <A href=Screen::Signup.path()>"Sign up"</A></p>
            {move || next.get().map(|target| view! { <Redirect path=target/> })}
        </section>
    }
}
