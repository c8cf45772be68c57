//! `/admin/subjects`

use leptos::ev::SubmitEvent;
use leptos::prelude::*;

use qparchive_common::protocol::{Id, SEMESTERS};

use crate::browser;
use crate::cascade::parse_selection;
use crate::components::fields::{options_of, value_of, Field, NoticeBanner, Picker};
use crate::pages::admin_subjects::AdminSubjectsPage;
use crate::views::{act, follow, notice_of, on_mount, Ui};

#[component]
pub fn AdminSubjectsView() -> impl IntoView {
    let ui = expect_context::<Ui>();
    let page = RwSignal::new(AdminSubjectsPage::new());

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
                AdminSubjectsPage::courses_loaded,
            );
        }
    });

    let pick_course = Callback::new({
        let ui = ui.clone();
        move |raw: String| {
            let id = parse_selection::<Id>(&raw);
            let ticket = page.try_update(|p| p.select_course(id)).flatten();
            let api = ui.app.api.clone();
            follow(
                &ui,
                page,
                ticket.zip(id),
                move |id| async move { api.subjects(id).await },
                AdminSubjectsPage::subjects_loaded,
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
            "Are you sure you want to delete this subject? \
             This might affect associated papers.",
        ) {
            return;
        }
        act(&ui, page, move |mut p, app| async move {
            p.delete(&app.api, id).await;
            p
        });
    });

    let semesters: Vec<(String, String)> = SEMESTERS
        .map(|s| (s.to_string(), format!("Semester {s}")))
        .collect();

    view! {
        <section class="page">
            <h1>"Manage Subjects"</h1>
            <div class="card pickers">
                <Picker
                    label="Department"
                    placeholder="Select a Department"
                    options=Signal::derive(move || page.with(|p| options_of(&p.departments)))
                    selected=Signal::derive(move || page.with(|p| value_of(&p.departments)))
                    disabled=Signal::derive(move || page.with(|p| p.departments.is_loading()))
                    on_pick=pick_department
                />
                <Picker
                    label="Course"
                    placeholder="Select a Course"
                    options=Signal::derive(move || page.with(|p| options_of(&p.courses)))
                    selected=Signal::derive(move || page.with(|p| value_of(&p.courses)))
                    disabled=Signal::derive(move || {
                        page.with(|p| p.departments.selected().is_none())
                    })
                    on_pick=pick_course
                />
            </div>

            <form class="card" on:submit=add>
                <h2>"Add New Subject"</h2>
                <Field
                    label="Subject Name"
                    value=Signal::derive(move || page.with(|p| p.draft.name.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.draft.name = v))
                />
                <Field
                    label="Subject Code"
                    value=Signal::derive(move || page.with(|p| p.draft.code.clone()))
                    on_input=Callback::new(move |v: String| page.update(|p| p.draft.code = v))
                />
                <Picker
                    label="Semester"
                    placeholder="Select Semester"
                    options=Signal::derive(move || semesters.clone())
                    selected=Signal::derive(move || {
                        page.with(|p| p.draft.semester.map(|s| s.to_string()).unwrap_or_default())
                    })
                    disabled=Signal::derive(|| false)
                    on_pick=Callback::new(move |raw: String| {
                        page.update(|p| p.draft.semester = parse_selection(&raw))
                    })
                />
                <button type="submit">"Add Subject"</button>
            </form>

            <NoticeBanner notice=notice_of(page)/>

            <div class="card">
                <h2>"Existing Subjects"</h2>
                <ul class="item-list">
                    {move || page.with(|p| {
                        p.subjects
                            .options()
                            .iter()
                            .map(|subject| {
                                let id = subject.id;
                                view! {
                                    <li>
                                        <span>
                                            {format!(
                                                "{} ({}) - Sem {}",
                                                subject.name,
                                                subject.code,
                                                subject.semester,
                                            )}
                                        </span>
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
