//! `/dashboard`

use leptos::prelude::*;
use leptos_router::components::A;
use tracing::debug;

use qparchive_common::protocol::Id;

use crate::app::Route as Screen;
use crate::browser;
use crate::cascade::parse_selection;
use crate::components::fields::{options_of, value_of, NoticeBanner, Picker};
use crate::pages::dashboard::DashboardPage;
use crate::views::{act, follow, notice_of, on_mount, Ui};

#[component]
pub fn DashboardView() -> impl IntoView {
    let ui = expect_context::<Ui>();
    let auth = ui.auth;
    let page = RwSignal::new(DashboardPage::new());

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
                DashboardPage::courses_loaded,
            );
        }
    });

    let pick_course = Callback::new(move |raw: String| {
        page.update(|p| p.select_course(parse_selection(&raw)));
    });

    let pick_semester = Callback::new({
        let ui = ui.clone();
        move |raw: String| {
            let semester = parse_selection::<u8>(&raw);
            let ticket = page.try_update(|p| p.select_semester(semester)).flatten();
            let course = page.with_untracked(|p| p.courses.selected());
            let api = ui.app.api.clone();
            follow(
                &ui,
                page,
                ticket.zip(course.zip(semester)),
                move |(course, semester)| async move {
                    api.subjects_for_semester(course, semester).await
                },
                DashboardPage::subjects_loaded,
            );
        }
    });

    let pick_subject = Callback::new({
        let ui = ui.clone();
        move |raw: String| {
            let id = parse_selection::<Id>(&raw);
            let ticket = page.try_update(|p| p.select_subject(id)).flatten();
            let api = ui.app.api.clone();
            follow(
                &ui,
                page,
                ticket.zip(id),
                move |id| async move { api.papers(id).await },
                DashboardPage::papers_loaded,
            );
        }
    });

    let download = Callback::new({
        let ui = ui.clone();
        move |paper_id: Id| {
            act(&ui, page, move |mut p, app| async move {
                if let Some((name, bytes)) = p.fetch_paper(&app.api, paper_id).await {
                    if let Err(e) = browser::offer_download(&name, &bytes) {
                        debug!("Saving {name} failed: {e}");
                        p.notice.set_error("Download failed.");
                    }
                }
                p
            });
        }
    });

    let delete = Callback::new({
        let ui = ui.clone();
        move |paper_id: Id| {
            if !browser::confirm("Are you sure you want to delete this paper?") {
                return;
            }
            act(&ui, page, move |mut p, app| async move {
                p.delete_paper(&app.api, paper_id, chrono::Utc::now()).await;
                p
            });
        }
    });

    let papers = move || {
        let user = auth.session().map(|s| s.user);
        let now = chrono::Utc::now();
        page.with(|p| {
            if p.papers.is_loading() {
                return view! { <p class="hint">"Loading papers..."</p> }.into_any();
            }
            if p.papers.options().is_empty() {
                return view! {
                    <p class="hint">"Please make a selection to see available papers."</p>
                }
                .into_any();
            }
            let deletable = user
                .as_ref()
                .map(|u| p.deletable(u, now))
                .unwrap_or_default();
            p.papers
                .options()
                .iter()
                .map(|paper| {
                    let id = paper.id;
                    let can_delete = deletable.contains(&id);
                    view! {
                        <div class="paper-card">
                            <div>
                                <p class="paper-name">{paper.original_name.clone()}</p>
                                <p>"Uploaded by: " {paper.uploaded_by.username.clone()}</p>
                                <p>"Year: " {paper.year} " | Session: " {paper.session.clone()}</p>
                            </div>
                            <div class="paper-actions">
                                <button on:click=move |_| download.run(id)>"Download"</button>
                                {can_delete.then(|| view! {
                                    <button class="danger" on:click=move |_| delete.run(id)>
                                        "Delete"
                                    </button>
                                })}
                            </div>
                        </div>
                    }
                })
                .collect_view()
                .into_any()
        })
    };

    view! {
        <section class="page">
            <div class="page-header">
                <h1>"Dashboard"</h1>
                <A href=Screen::Upload.path()>"Upload New Paper"</A>
            </div>

            <div class="card">
                <h2>"Find Previous Year Papers"</h2>
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
                    <Picker
                        label="Semester"
                        placeholder="Select Semester"
                        options=Signal::derive(move || page.with(|p| options_of(&p.semesters)))
                        selected=Signal::derive(move || page.with(|p| value_of(&p.semesters)))
                        disabled=Signal::derive(move || page.with(|p| p.courses.selected().is_none()))
                        on_pick=pick_semester
                    />
                    <Picker
                        label="Subject"
                        placeholder="Select Subject"
                        options=Signal::derive(move || page.with(|p| options_of(&p.subjects)))
                        selected=Signal::derive(move || page.with(|p| value_of(&p.subjects)))
                        disabled=Signal::derive(move || {
                            page.with(|p| p.semesters.selected().is_none())
                        })
                        on_pick=pick_subject
                    />
                </div>
            </div>

            <NoticeBanner notice=notice_of(page)/>

            <div>
                <h2>"Available Papers"</h2>
                {papers}
            </div>
        </section>
    }
}
