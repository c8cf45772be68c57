//! `/upload`

use leptos::ev::SubmitEvent;
use leptos::prelude::*;

use qparchive_common::protocol::{Id, SEMESTERS};

use crate::browser;
use crate::cascade::parse_selection;
use crate::components::fields::{options_of, value_of, Field, NoticeBanner, Picker};
use crate::pages::upload::UploadPage;
use crate::views::{act, follow, notice_of, on_mount, Ui};

#[component]
pub fn UploadView() -> impl IntoView {
    let ui = expect_context::<Ui>();
    let page = RwSignal::new(UploadPage::new());
    let busy = RwSignal::new(false);

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
                UploadPage::courses_loaded,
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
                UploadPage::subjects_loaded,
            );
        }
    });

    let pick_subject = Callback::new(move |raw: String| {
        page.update(|p| p.select_subject(parse_selection(&raw)));
    });

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        busy.set(true);
        act(&ui, page, move |mut p, app| async move {
            p.submit(&app.api).await;
            busy.set(false);
            p
        });
    };

    let semesters: Vec<(String, String)> = SEMESTERS
        .map(|s| (s.to_string(), format!("Semester {s}")))
        .collect();

    view! {
        <section class="page">
            <h1>"Upload New Question Paper"</h1>
            <form class="card" on:submit=submit>
                <div class="pickers">
                    <Picker
                        label="Department"
                        placeholder="Select Department"
                        options=Signal::derive(move || page.with(|p| options_of(&p.departments)))
                        selected=Signal::derive(move || page.with(|p| value_of(&p.departments)))
                        disabled=Signal::derive(move || page.with(|p| p.departments.is_loading()))
                        on_pick=pick_department
                    />
                    <Picker
                        label="Course"
                        placeholder="Select Course"
                        options=Signal::derive(move || page.with(|p| options_of(&p.courses)))
                        selected=Signal::derive(move || page.with(|p| value_of(&p.courses)))
                        disabled=Signal::derive(move || {
                            page.with(|p| p.departments.selected().is_none())
                        })
                        on_pick=pick_course
                    />
                </div>
                <Picker
                    label="Subject"
                    placeholder="Select Subject"
                    options=Signal::derive(move || page.with(|p| options_of(&p.subjects)))
                    selected=Signal::derive(move || page.with(|p| value_of(&p.subjects)))
                    disabled=Signal::derive(move || page.with(|p| p.courses.selected().is_none()))
                    on_pick=pick_subject
                />
                <div class="pickers">
                    <Picker
                        label="Semester"
                        placeholder="Select Semester"
                        options=Signal::derive(move || semesters.clone())
                        selected=Signal::derive(move || {
                            page.with(|p| p.form.semester.map(|s| s.to_string()).unwrap_or_default())
                        })
                        disabled=Signal::derive(|| false)
                        on_pick=Callback::new(move |raw: String| {
                            page.update(|p| p.form.semester = parse_selection(&raw))
                        })
                    />
                    <Field
                        label="Year"
                        kind="number"
                        value=Signal::derive(move || {
                            page.with(|p| p.form.year.map(|y| y.to_string()).unwrap_or_default())
                        })
                        on_input=Callback::new(move |v: String| {
                            page.update(|p| p.form.year = parse_selection(&v))
                        })
                    />
                    <Field
                        label="Session"
                        value=Signal::derive(move || page.with(|p| p.form.session.clone()))
                        on_input=Callback::new(move |v: String| page.update(|p| p.form.session = v))
                    />
                </div>
                <label class="field">
                    <span class="field-label">"Question Paper File (PDF only)"</span>
                    <input
                        type="file"
                        accept="application/pdf"
                        on:change=move |ev| {
                            browser::read_picked_file(&ev, move |file| {
                                page.update(|p| p.form.file = file)
                            })
                        }
                    />
                </label>

                <NoticeBanner notice=notice_of(page)/>

                <button type="submit" disabled=move || busy.get()>
                    {move || if busy.get() { "Uploading..." } else { "Upload Paper" }}
                </button>
            </form>
        </section>
    }
}
