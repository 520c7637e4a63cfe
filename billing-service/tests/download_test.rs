mod common;

use chrono::Utc;
use common::{bill_at, TestApp};

#[tokio::test]
async fn download_streams_a_pdf_named_after_the_bill() {
    let app = TestApp::spawn().await;
    let bill = bill_at("C100", "T1", 1500.0, 500.0, Utc::now());
    let bill_id = bill.bill_id.clone();
    app.bills.seed(bill);

    let response = app
        .client
        .get(app.url(&format!("/download_bill/{bill_id}")))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/pdf")
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains(&format!("bill_{bill_id}.pdf")));
    assert!(disposition.starts_with("attachment"));

    let bytes = response.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn downloading_a_missing_bill_redirects_with_a_notice() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/download_bill/no-such-bill"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(location.starts_with("/bills"));
    assert!(location.contains("notice="));
}
