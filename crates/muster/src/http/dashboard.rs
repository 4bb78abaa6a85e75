use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use muster_db::{Filter, Store, WhereClause};

use crate::model::{Event, Ip};
use crate::service::{EventService, IpService};

use super::error::ApiError;

const CELL: &str =
    "border-b border-t-0 border-s-0 border-e-0 border-white border-solid border-collapse p-2 text-center";

const WARNING_ICON: &str = r#"<svg fill="currentColor" class="text-red w-3 h-3 absolute top-1/2 end-1/4 translate-middle" viewBox="0 0 478.125 478.125" xmlns="http://www.w3.org/2000/svg">
    <circle cx="239.904" cy="314.721" r="35.878"/>
    <path d="M256.657,127.525h-31.9c-10.557,0-19.125,8.645-19.125,19.125v101.975c0,10.48,8.645,19.125,19.125,19.125h31.9 c10.48,0,19.125-8.645,19.125-19.125V146.65C275.782,136.17,267.138,127.525,256.657,127.525z"/>
    <path d="M239.062,0C106.947,0,0,106.947,0,239.062s106.947,239.062,239.062,239.062c132.115,0,239.062-106.947,239.062-239.062 S371.178,0,239.062,0z M239.292,409.734c-94.171,0-170.595-76.348-170.595-170.596c0-94.248,76.347-170.595,170.595-170.595 s170.595,76.347,170.595,170.595C409.887,333.387,333.464,409.734,239.292,409.734z"/>
</svg>"#;

/// The landing page: every event with its occupancy, and the blacklist with
/// one unblock button per address.
pub async fn index(State(db): State<Arc<Store>>) -> Result<Html<String>, ApiError> {
    let mut events = EventService::new(&db).get(&WhereClause::empty())?;
    let blacklisted = IpService::new(&db)
        .get(&Filter::new().and_where("blacklisted", "=", true).build())?;

    let mut event_rows = String::new();
    if events.is_empty() {
        event_rows.push_str(
            r#"<tr><td colspan="5" class="text-center text-xl p-4">No Events Found.</td></tr>"#,
        );
    } else {
        for event in &mut events {
            event_rows.push_str(&event_row(&db, event)?);
        }
    }

    let mut ip_rows = String::new();
    if blacklisted.is_empty() {
        ip_rows.push_str(
            r#"<tr><td colspan="5" class="text-center text-xl p-4">No Blacklisted IPs.</td></tr>"#,
        );
    } else {
        for ip in &blacklisted {
            ip_rows.push_str(&ip_row(ip));
        }
    }

    Ok(Html(page(&event_rows, &ip_rows)))
}

/// Removes an address from the blacklist and returns to the dashboard. A
/// stale id redirects all the same.
pub async fn unblock(
    State(db): State<Arc<Store>>,
    Path(id): Path<i64>,
) -> Result<Redirect, ApiError> {
    let service = IpService::new(&db);
    if let Some(ip) = service.find(id)? {
        service.delete(&ip)?;
    }
    Ok(Redirect::to("/"))
}

fn event_row(db: &Store, event: &mut Event) -> muster_db::Result<String> {
    let percentage = event.capacity_rate_percent(db)?;
    let warning = if event.capacity_rate(db)? >= 80.0 {
        WARNING_ICON
    } else {
        ""
    };
    let visitors = event.registration_count(db)?;
    let capacity = event.capacity(db)?;
    let location = match event.location(db)? {
        Some(location) => escape(&location.name),
        None => String::new(),
    };
    Ok(format!(
        r#"<tr>
    <td class="{CELL}">{name}</td>
    <td class="{CELL} text-lg relative">{percentage} {warning}</td>
    <td class="{CELL}">{visitors} / {capacity}</td>
    <td class="{CELL}">{location}</td>
</tr>"#,
        name = escape(&event.name),
        percentage = escape(&percentage),
    ))
}

fn ip_row(ip: &Ip) -> String {
    let id = ip.id.unwrap_or_default();
    format!(
        r#"<tr>
    <td class="{CELL}">{address}</td>
    <td class="{CELL}">{blocked_at}</td>
    <td class="{CELL}">
        <form method="POST" action="/blacklisted/unblock/{id}">
            <button class="bg-red rounded p-2 border-0 font-bold text-white cursor-pointer transition hover:bg-dark-red">Unblock</button>
        </form>
    </td>
</tr>"#,
        address = escape(&ip.ip_address),
        blocked_at = ip.created_at.format("%d.%m.%Y %H:%M:%S"),
    )
}

fn page(event_rows: &str, ip_rows: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Event Management System</title>
    <link rel="stylesheet" href="/styles/style.min.css">
</head>
<body class="bg-dark-navy text-white">
    <main class="min-h-full-view my-10">
        <h1 class="text-4xl text-center"><span class="text-red">Event</span> Management System</h1>

        <div class="rounded-sm p-4 bg-navy w-70% mx-auto my-10">
            <h2 class="text-2xl text-white text-start mb-4">Events Overview</h2>
            <table class="w-full border-collapse rounded-sm">
                <thead>
                    <tr class="bg-white text-navy">
                        <th class="p-2">Event</th>
                        <th class="p-2">Capacity Rate</th>
                        <th class="p-2">Visitors</th>
                        <th class="p-2">Location</th>
                    </tr>
                </thead>
                <tbody>
{event_rows}
                </tbody>
            </table>
        </div>

        <div class="rounded-sm p-4 bg-navy w-70% mx-auto my-10">
            <h2 class="text-2xl text-white text-start mb-4">API Blacklist</h2>
            <table class="w-full border-collapse rounded-sm">
                <thead>
                    <tr class="bg-white text-navy">
                        <th class="p-2">IP Addres</th>
                        <th class="p-2">Blocked at</th>
                        <th class="p-2">Unblock</th>
                    </tr>
                </thead>
                <tbody>
{ip_rows}
                </tbody>
            </table>
        </div>
    </main>
</body>
</html>"#
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}
