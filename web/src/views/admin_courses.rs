//! `/admin/courses`

use leptos::ev::SubmitEvent;
use leptos::prelude::*;

use qparchive_common::protocol::Id;

use crate::browser;
use crate::cascade::parse_selection;
use crate::components::fields::{options_of, value_of, Field, NoticeBanner, Picker};
use crate::pages::admin_courses::AdminCoursesPage;
use crate::views::{act, follow, notice_of, on_mount, Ui};

#[component]
pub fn AdminCoursesView() -> impl IntoView {
    let ui = expect_context::<Ui>();
    let page = RwSignal::new(AdminCoursesPage::new());

    on_mount(&ui, page, |mut p, app| async move {
        p.mount(&app.api).await;
        p
    });

    let pick_department = Callback::new({
        let ui = ui.clone();
        move |raw: String| {
            let id = parse_selection::<Id>(&raw);
            let ticket = page.try_update(|p| p.select_department(id)).flatten();
            let api = ui.app.api.clone();
            follow(
                &ui,
                page,
                ticket.zip(id),
                move |id| async move { api.courses(id).await },
                AdminCoursesPage::courses_loaded,
            );
        }
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
            "Are you sure you want to delete this course? \
             This will also delete all associated subjects.",
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
            <h1>"Manage Courses"</h1>
            <div class="card">
                <Picker
                    label="Department"
                    placeholder="Select a Department"
                    options=Signal::derive(move || page.with(|p| options_of(&p.departments)))
                    selected=Signal::derive(move || page.with(|p| value_of(&p.departments)))
                    disabled=Signal::derive(move || page.with(|p| p.departments.is_loading()))
                    on_pick=pick_department
                />
            </div>

            <form class="card" on:submit=add>
                <h2>"Add New Course"</h2>
                <Field
                    label="Course Name"
                    value=Signal::derive(move || page.with(|p| p.new_name.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.new_name = v))
                />
                <Field
                    label="Course Code"
                    value=Signal::derive(move || page.with(|p| p.new_code.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.new_code = v))
                />
                <button type="submit">"Add Course"</button>
            </form>

            <NoticeBanner notice=notice_of(page)/>

            <div class="card">
                <h2>"Existing Courses"</h2>
                <ul class="item-list">
                    {move || page.with(|p| {
                        p.courses
                            .options()
                            .iter()
                            .map(|course| {
                                let id = course.id;
                                view! {
                                    <li>
                                        <span>{format!("{} ({})", course.name, course.code)}</span>
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
