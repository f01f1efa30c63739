//! Manual end-to-end driver for a running CivicDesk server.
//!
//! Walks the whole lifecycle with real HTTP calls: citizen signup and
//! complaint submission, staff resolution (counter +1), a cross-department
//! rejection, and an admin deletion (counter back to 0). Optionally seeds
//! a batch of complaints first.

use anyhow::{Context, Result, ensure};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
};
use serde_json::{Value, json};
use uuid::Uuid;

// 1x1 transparent PNG, enough to exercise the storage upload path.
const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x62, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the running server.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    base: String,

    /// Extra complaints to seed before the lifecycle checks.
    #[arg(long, default_value_t = 0)]
    seed: u32,
}

fn session_client() -> Result<Client> {
    Ok(Client::builder().cookie_store(true).build()?)
}

async fn signup(client: &Client, base: &str, role: &str, ward_department: &str) -> Result<String> {
    let email = format!("{role}-{}@tester.local", Uuid::new_v4());
    let resp = client
        .post(format!("{base}/api/signup"))
        .json(&json!({
            "fullname": format!("Tester {role}"),
            "email": email,
            "password": "tester-password",
            "role": role,
            "ward_department": ward_department,
        }))
        .send()
        .await?;

    ensure!(
        resp.status() == StatusCode::CREATED,
        "signup as {role} failed: {}",
        resp.text().await?
    );
    Ok(email)
}

async fn submit_complaint(client: &Client, base: &str) -> Result<Value> {
    let form = Form::new()
        .text("title", "Pothole")
        .text("category", "roads")
        .text("location", "5th Ave")
        .text("description", "deep pothole")
        .part(
            "image",
            Part::bytes(PNG.to_vec())
                .file_name("photo.png")
                .mime_str("image/png")?,
        );

    let resp = client
        .post(format!("{base}/api/submit"))
        .multipart(form)
        .send()
        .await?;

    ensure!(
        resp.status() == StatusCode::CREATED,
        "submit failed: {}",
        resp.text().await?
    );

    let body: Value = resp.json().await?;
    let complaint = body["complaint"].clone();
    ensure!(complaint["status"] == "pending", "new complaint not pending");
    Ok(complaint)
}

async fn set_status(client: &Client, base: &str, id: &str, status: &str) -> Result<StatusCode> {
    let resp = client
        .put(format!("{base}/api/staff/complaints/{id}"))
        .json(&json!({ "status": status }))
        .send()
        .await?;
    Ok(resp.status())
}

async fn resolved_count(client: &Client, base: &str, email: &str) -> Result<u64> {
    let resp = client
        .get(format!("{base}/api/admin/staff"))
        .query(&[("search", email)])
        .send()
        .await?;

    let body: Value = resp.json().await?;
    let entry = body["staff"]
        .as_array()
        .and_then(|staff| staff.first())
        .context("staff member missing from directory")?
        .clone();
    entry["resolved_count"]
        .as_u64()
        .context("resolved_count missing")
}

async fn seed(client: &Client, base: &str, count: u32) -> Result<()> {
    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    for n in 0..count {
        pb.set_message(format!("Seeding complaint {n}"));
        submit_complaint(client, base).await?;
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let base = args.base.trim_end_matches('/').to_string();

    let citizen = session_client()?;
    signup(&citizen, &base, "citizen", "ward 4").await?;

    if args.seed > 0 {
        seed(&citizen, &base, args.seed).await?;
    }

    let complaint = submit_complaint(&citizen, &base).await?;
    let complaint_id = complaint["id"].as_str().context("complaint id")?.to_string();
    println!("submitted complaint {complaint_id}");

    let roads_staff = session_client()?;
    let staff_email = signup(&roads_staff, &base, "staff", "roads").await?;

    let water_staff = session_client()?;
    signup(&water_staff, &base, "staff", "water").await?;

    let status = set_status(&water_staff, &base, &complaint_id, "resolved").await?;
    ensure!(
        status == StatusCode::FORBIDDEN,
        "cross-department update was not rejected: {status}"
    );
    println!("cross-department update rejected");

    let status = set_status(&roads_staff, &base, &complaint_id, "bogus").await?;
    ensure!(
        status == StatusCode::BAD_REQUEST,
        "invalid status was not rejected: {status}"
    );

    let status = set_status(&roads_staff, &base, &complaint_id, "resolved").await?;
    ensure!(status == StatusCode::OK, "resolve failed: {status}");
    println!("complaint resolved");

    let admin = session_client()?;
    signup(&admin, &base, "admin", "").await?;

    let count = resolved_count(&admin, &base, &staff_email).await?;
    ensure!(count == 1, "expected resolved count 1, got {count}");
    println!("resolved count incremented");

    let resp = admin
        .post(format!("{base}/api/complaints/delete"))
        .json(&json!({ "id": complaint_id }))
        .send()
        .await?;
    ensure!(resp.status() == StatusCode::OK, "delete failed");

    let count = resolved_count(&admin, &base, &staff_email).await?;
    ensure!(count == 0, "expected resolved count 0 after delete, got {count}");
    println!("resolved count decremented on delete");

    println!("all lifecycle checks passed");
    Ok(())
}
