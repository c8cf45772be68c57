//! `/admin/departments`

use leptos::ev::SubmitEvent;
use leptos::prelude::*;

use qparchive_common::protocol::Id;

use crate::browser;
use crate::components::fields::{Field, NoticeBanner};
use crate::pages::admin_departments::AdminDepartmentsPage;
use crate::views::{act, notice_of, on_mount, Ui};

#[component]
pub fn AdminDepartmentsView() -> impl IntoView {
    let ui = expect_context::<Ui>();
    let page = RwSignal::new(AdminDepartmentsPage::new());

    on_mount(&ui, page, |mut p, app| async move {
        p.mount(&app.api).await;
        p
    });

    let add = {
        let ui = ui.clone();
        move |ev: SubmitEvent| {
            ev.prevent_default();
            act(&ui, page, |mut p, app| async move {
                p.add(&app.api).await;
                p
            });
        }
    };

    let delete = Callback::new(move |id: Id| {
        if !browser::confirm(
            "Are you sure you want to delete this department? \
             This might affect associated courses and subjects.",
        ) {
            return;
        }
        act(&ui, page, move |mut p, app| async move {
            p.delete(&app.api, id).await;
            p
        });
    });

    view! {
        <section class="page">
            <h1>"Manage Departments"</h1>
            <form class="card" on:submit=add>
                <h2>"Add New Department"</h2>
                <Field
                    label="Department Name"
                    value=Signal::derive(move || page.with(|p| p.new_name.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.new_name = v))
                />
                <Field
                    label="Department Code"
                    value=Signal::derive(move || page.with(|p| p.new_code.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.new_code = v))
                />
                <button type="submit">"Add Department"</button>
            </form>

            <NoticeBanner notice=notice_of(page)/>

            <div class="card">
                <h2>"Existing Departments"</h2>
                <ul class="item-list">
                    {move || page.with(|p| {
                        p.departments
                            .options()
                            .iter()
                            .map(|dept| {
                                let id = dept.id;
                                view! {
                                    <li>
                                        <span>{format!("{} ({})", dept.name, dept.code)}</span>
                                        <button class="danger" on:click=move |_| delete.run(id)>
                                            "Delete"
                                        </button>
                                    </li>
                                }
                            })
                            .collect_view()
                    })}
                </ul>
            </div>
        </section>
    }
}
