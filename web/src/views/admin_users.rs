//! `/admin/users`

use leptos::ev::SubmitEvent;
use leptos::prelude::*;

use qparchive_common::protocol::Role;

use crate::components::fields::{Field, NoticeBanner, Picker};
use crate::pages::admin_users::AdminUsersPage;
use crate::views::{act, notice_of, Ui};

#[component]
pub fn AdminUsersView() -> impl IntoView {
    let ui = expect_context::<Ui>();
    let page = RwSignal::new(AdminUsersPage::new());

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        act(&ui, page, |mut p, app| async move {
            p.submit(&app.api).await;
            p
        });
    };

    let roles = vec![
        (Role::Student.to_string(), "Student".to_string()),
        (Role::Admin.to_string(), "Admin".to_string()),
    ];

    view! {
        <section class="page">
            <h1>"Create New User"</h1>
            <form class="card" on:submit=submit>
                <Field
                    label="Username"
                    value=Signal::derive(move || page.with(|p| p.username.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.username = v))
                />
                <Field
                    label="Email"
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
                <Picker
                    label="Role"
                    placeholder="Select Role"
                    options=Signal::derive(move || roles.clone())
                    selected=Signal::derive(move || page.with(|p| p.role.to_string()))
                    disabled=Signal::derive(|| false)
                    on_pick=Callback::new(move |raw: String| {
                        page.update(|p| p.role = raw.parse().unwrap_or_default())
                    })
                />
                <NoticeBanner notice=notice_of(page)/>
                <button type="submit">"Create User"</button>
            </form>
        </section>
    }
}
