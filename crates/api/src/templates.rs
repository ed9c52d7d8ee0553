//! Site pages.

use domain::{ChosenModel, RentDraft};

use crate::render::{Page, RenderError, TemplateData, escape};

pub const HOME: &str = "home.page";
pub const ABOUT: &str = "about.page";
pub const CONTACT: &str = "contact.page";
pub const MODEL: &str = "model.page";
pub const CHECK_AVAILABILITY: &str = "check-availability.page";
pub const CHOOSE_MODEL: &str = "choose-model.page";
pub const RENT: &str = "rent.page";
pub const RENT_SUMMARY: &str = "rent-summary.page";

/// Wraps a page body with the navigation and one-shot alerts.
pub fn layout(page: &Page, data: &TemplateData) -> String {
    let mut alerts = String::new();
    for (class, message) in [
        ("flash", &data.flash),
        ("warning", &data.warning),
        ("error", &data.error),
    ] {
        if let Some(message) = message {
            alerts.push_str(&format!(
                r#"<div class="alert alert-{class}" role="alert">{}</div>"#,
                escape(message)
            ));
        }
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Vehicle Rent</title>
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/about">About</a>
<a href="/check-availability">Rent a vehicle</a>
<a href="/contact">Contact</a>
</nav>
<main>
{alerts}
{body}
</main>
</body>
</html>
"#,
        title = escape(&page.title),
        body = page.body,
    )
}

/// Whether the named page carries a form that posts a CSRF token.
pub fn has_form(name: &str) -> bool {
    matches!(name, MODEL | CHECK_AVAILABILITY | RENT)
}

fn csrf_field(data: &TemplateData) -> String {
    format!(
        r#"<input type="hidden" name="csrf_token" value="{}">"#,
        escape(&data.csrf_token)
    )
}

pub fn home(_data: &TemplateData) -> Result<Page, RenderError> {
    Ok(Page {
        title: "Home".into(),
        body: r#"<h1>Rent your next electric vehicle</h1>
<p>Pick your dates and we will show you every model free for the whole trip.</p>
<p><a href="/check-availability">Check availability</a></p>"#
            .into(),
    })
}

pub fn about(_data: &TemplateData) -> Result<Page, RenderError> {
    Ok(Page {
        title: "About".into(),
        body: r#"<h1>About us</h1>
<p>We rent electric vehicles by the day. Every booking covers whole days,
from the pick-up date up to the return date.</p>"#
            .into(),
    })
}

pub fn contact(_data: &TemplateData) -> Result<Page, RenderError> {
    Ok(Page {
        title: "Contact".into(),
        body: r#"<h1>Contact</h1>
<p>Questions about a rent? Write to us and we will get back within a day.</p>"#
            .into(),
    })
}

pub fn model(data: &TemplateData) -> Result<Page, RenderError> {
    let model: ChosenModel = data.decode("model")?;
    let name = escape(&model.name);

    Ok(Page {
        title: model.name.clone(),
        body: format!(
            r#"<h1>{name}</h1>
<form id="model-availability" method="post" action="/check-availability-json">
{csrf}
<input type="hidden" name="model_id" value="{id}">
<label>Start <input type="date" name="start" required></label>
<label>End <input type="date" name="end" required></label>
<button type="submit">Check availability</button>
</form>
<p id="availability-result"></p>
<script>
document.getElementById("model-availability").addEventListener("submit", async (event) => {{
  event.preventDefault();
  const form = event.target;
  const response = await fetch(form.action, {{ method: "post", body: new URLSearchParams(new FormData(form)) }});
  const result = await response.json();
  const out = document.getElementById("availability-result");
  if (result.ok) {{
    const params = new URLSearchParams({{ id: result.model_id, s: result.start_date, e: result.end_date }});
    out.innerHTML = '<a href="/rent-vehicle?' + params + '">Available! Book now</a>';
  }} else {{
    out.textContent = "Not available for these dates";
  }}
}});
</script>"#,
            csrf = csrf_field(data),
            id = model.id,
        ),
    })
}

pub fn check_availability(data: &TemplateData) -> Result<Page, RenderError> {
    Ok(Page {
        title: "Check availability".into(),
        body: format!(
            r#"<h1>Check availability</h1>
<form method="post" action="/check-availability">
{csrf}
<label>Start date <input type="date" name="start" value="{start}" required></label>
<label>End date <input type="date" name="end" value="{end}" required></label>
<button type="submit">Search</button>
</form>"#,
            csrf = csrf_field(data),
            start = escape(data.string("start_date")),
            end = escape(data.string("end_date")),
        ),
    })
}

pub fn choose_model(data: &TemplateData) -> Result<Page, RenderError> {
    let models: Vec<ChosenModel> = data.decode("models")?;

    let mut items = String::new();
    for model in &models {
        items.push_str(&format!(
            r#"<li><a href="/choose-model/{}">{}</a></li>"#,
            model.id,
            escape(&model.name)
        ));
    }

    Ok(Page {
        title: "Choose a model".into(),
        body: format!(
            r#"<h1>Choose a model</h1>
<p>Available from {start} to {end}:</p>
<ul class="models">{items}</ul>"#,
            start = escape(data.string("start_date")),
            end = escape(data.string("end_date")),
        ),
    })
}

fn input(data: &TemplateData, field: &str, label: &str, kind: &str, value: &str) -> String {
    let error = data
        .form
        .errors()
        .get(field)
        .map(|message| format!(r#"<span class="field-error">{}</span>"#, escape(message)))
        .unwrap_or_default();
    format!(
        r#"<label>{label} <input type="{kind}" name="{field}" value="{value}"></label>{error}"#,
        value = escape(value),
    )
}

pub fn rent(data: &TemplateData) -> Result<Page, RenderError> {
    let draft: RentDraft = data.decode("rent")?;
    let model_name = draft.model().map(|m| m.name.as_str()).unwrap_or_default();

    // Re-displayed submissions win over what the draft holds.
    let value = |field: &str| -> String {
        if data.form.has(field) {
            return data.form.get(field).to_string();
        }
        let contact = draft.contact();
        let stored = match field {
            "first_name" => contact.map(|c| c.first_name.clone()),
            "last_name" => contact.map(|c| c.last_name.clone()),
            "email" => contact.map(|c| c.email.clone()),
            "phone" => contact.map(|c| c.phone.clone()),
            _ => None,
        };
        stored.unwrap_or_default()
    };

    Ok(Page {
        title: "Make a rent".into(),
        body: format!(
            r#"<h1>Make a rent</h1>
<p>Vehicle: <strong>{model}</strong></p>
<p>From {start} to {end}</p>
<form method="post" action="/rent" novalidate>
{csrf}
{first}
{last}
{email}
{phone}
<button type="submit">Make rent</button>
</form>"#,
            model = escape(model_name),
            start = escape(data.string("start_date")),
            end = escape(data.string("end_date")),
            csrf = csrf_field(data),
            first = input(data, "first_name", "First name", "text", &value("first_name")),
            last = input(data, "last_name", "Last name", "text", &value("last_name")),
            email = input(data, "email", "Email", "email", &value("email")),
            phone = input(data, "phone", "Phone", "text", &value("phone")),
        ),
    })
}

pub fn rent_summary(data: &TemplateData) -> Result<Page, RenderError> {
    let draft: RentDraft = data.decode("rent")?;
    let contact = draft.contact().cloned().unwrap_or_default();
    let model_name = draft.model().map(|m| m.name.as_str()).unwrap_or_default();
    let reference = draft.rent_id().map(|id| id.to_string()).unwrap_or_default();

    Ok(Page {
        title: "Rent summary".into(),
        body: format!(
            r#"<h1>Rent summary</h1>
<table class="summary">
<tr><th>Reference</th><td>{reference}</td></tr>
<tr><th>Name</th><td>{first} {last}</td></tr>
<tr><th>Email</th><td>{email}</td></tr>
<tr><th>Phone</th><td>{phone}</td></tr>
<tr><th>Vehicle</th><td>{model}</td></tr>
<tr><th>Start date</th><td>{start}</td></tr>
<tr><th>End date</th><td>{end}</td></tr>
</table>"#,
            first = escape(&contact.first_name),
            last = escape(&contact.last_name),
            email = escape(&contact.email),
            phone = escape(&contact.phone),
            model = escape(model_name),
            start = escape(data.string("start_date")),
            end = escape(data.string("end_date")),
        ),
    })
}
