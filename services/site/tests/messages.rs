mod common;

use axum::http::StatusCode;
use common::*;
use dealership_core::domain::{AccountType, Identity};
use pretty_assertions::assert_eq;

struct Inbox {
    app: TestApp,
    ann: Identity,
    bob: Identity,
}

async fn two_accounts() -> Inbox {
    let app = TestApp::new();
    let ann = app.account("Ann", "Lee", "ann@example.com", AccountType::Client).await;
    let bob = app.account("Bob", "Ray", "bob@example.com", AccountType::Client).await;
    Inbox { app, ann, bob }
}

async fn send_to(inbox: &Inbox, to: &Identity, subject: &str) -> i32 {
    let to = to.account_id.to_string();
    let res = inbox
        .app
        .send(post_form(
            "/message/createMessage",
            &[
                ("message_to", to.as_str()),
                ("message_subject", subject),
                ("message_body", "Is the Beetle still available?"),
            ],
            Some(&inbox.app.session_for(&inbox.ann)),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    inbox.app.store.messages().last().unwrap().message_id
}

#[tokio::test]
async fn sent_message_lands_in_the_recipients_inbox() {
    let inbox = two_accounts().await;
    send_to(&inbox, &inbox.bob, "Beetle").await;

    let stored = inbox.app.store.messages()[0].clone();
    assert_eq!(stored.from_account, inbox.ann.account_id);
    assert_eq!(stored.from_name, "Ann Lee");

    let view = page(
        inbox
            .app
            .send(get("/message/", Some(&inbox.app.session_for(&inbox.bob))))
            .await,
    )
    .await;
    assert_eq!(view["title"], "Bob Ray Inbox");
    assert_eq!(view["data"]["unread"], 1);
    assert_eq!(view["data"]["messages"][0]["subject"], "Beetle");

    let own = page(
        inbox
            .app
            .send(get("/message/", Some(&inbox.app.session_for(&inbox.ann))))
            .await,
    )
    .await;
    assert_eq!(own["data"]["messages"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn sender_is_always_the_caller() {
    let inbox = two_accounts().await;
    let bob = inbox.bob.account_id.to_string();
    let ann = inbox.ann.account_id.to_string();

    let res = inbox
        .app
        .send(post_form(
            "/message/createMessage",
            &[
                ("message_to", ann.as_str()),
                ("message_from", bob.as_str()),
                ("account_id", bob.as_str()),
                ("message_subject", "Hello"),
                ("message_body", "From me"),
            ],
            Some(&inbox.app.session_for(&inbox.ann)),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(inbox.app.store.messages()[0].from_account, inbox.ann.account_id);
}

#[tokio::test]
async fn invalid_message_is_re_rendered_with_errors() {
    let inbox = two_accounts().await;
    let res = inbox
        .app
        .send(post_form(
            "/message/createMessage",
            &[("message_to", ""), ("message_subject", "Hi"), ("message_body", "")],
            Some(&inbox.app.session_for(&inbox.ann)),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let view = page(res).await;
    assert_eq!(view["template"], "message/create-message");
    assert_eq!(
        error_for(&view, "message_to").as_deref(),
        Some("Please select a recipient.")
    );
    assert_eq!(
        error_for(&view, "message_body").as_deref(),
        Some("Please provide a message.")
    );
    assert_eq!(view["form"]["message_subject"], "Hi");
    assert!(inbox.app.store.messages().is_empty());
}

#[tokio::test]
async fn unknown_recipient_is_a_field_error() {
    let inbox = two_accounts().await;
    let res = inbox
        .app
        .send(post_form(
            "/message/createMessage",
            &[("message_to", "999"), ("message_subject", "Hi"), ("message_body", "?")],
            Some(&inbox.app.session_for(&inbox.ann)),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        error_for(&page(res).await, "message_to").as_deref(),
        Some("Please select a recipient.")
    );
}

#[tokio::test]
async fn only_the_recipient_can_open_or_change_a_message() {
    let inbox = two_accounts().await;
    let id = send_to(&inbox, &inbox.bob, "Private").await;
    let ann_session = inbox.app.session_for(&inbox.ann);
    let bob_session = inbox.app.session_for(&inbox.bob);

    let res = inbox
        .app
        .send(get(&format!("/message/detail/{}", id), Some(&ann_session)))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let id_text = id.to_string();
    let res = inbox
        .app
        .send(post_form("/message/delete", &[("message_id", id_text.as_str())], Some(&ann_session)))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(inbox.app.store.messages().len(), 1);

    let res = inbox
        .app
        .send(get(&format!("/message/detail/{}", id), Some(&bob_session)))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let view = page(res).await;
    assert_eq!(view["template"], "message/message");
    assert_eq!(view["title"], "Private");
}

#[tokio::test]
async fn read_archive_and_delete_update_the_counts() {
    let inbox = two_accounts().await;
    let id = send_to(&inbox, &inbox.bob, "Beetle").await.to_string();
    let bob = inbox.app.session_for(&inbox.bob);
    let act = |uri: &'static str| post_form(uri, &[("message_id", id.as_str())], Some(&bob));

    let res = inbox.app.send(act("/message/read")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res).as_deref(), Some("/message/"));
    assert!(inbox.app.store.messages()[0].read);

    inbox.app.send(act("/message/unread")).await;
    assert!(!inbox.app.store.messages()[0].read);

    let res = inbox.app.send(act("/message/archive")).await;
    let flash = set_cookie(&res, "flash").unwrap();
    let cookies = format!("{}; {}", bob, cookie_pair(&flash));
    let view = page(inbox.app.send(get("/message/", Some(&cookies))).await).await;
    assert_eq!(notices(&view), vec!["Message archived."]);
    assert_eq!(view["data"]["unread"], 0);
    assert_eq!(view["data"]["archived"], 1);

    let archive = page(inbox.app.send(get("/message/archive", Some(&bob))).await).await;
    assert_eq!(archive["data"]["messages"][0]["subject"], "Beetle");

    inbox.app.send(act("/message/delete")).await;
    assert!(inbox.app.store.messages().is_empty());
}

#[tokio::test]
async fn reply_form_quotes_the_original_and_offers_only_its_sender() {
    let inbox = two_accounts().await;
    let id = send_to(&inbox, &inbox.bob, "Beetle").await.to_string();
    let bob = inbox.app.session_for(&inbox.bob);

    let res = inbox
        .app
        .send(post_form("/message/reply", &[("message_id", id.as_str())], Some(&bob)))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let view = page(res).await;
    assert_eq!(view["template"], "message/reply-to-message");
    assert_eq!(view["form"]["message_to"], inbox.ann.account_id.to_string());
    assert_eq!(
        view["form"]["message_body"],
        "//////// Is the Beetle still available? ////////"
    );
    let recipients = view["data"]["recipients"].as_array().unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0]["name"], "Ann Lee");

    let ann_id = inbox.ann.account_id.to_string();
    let res = inbox
        .app
        .send(post_form(
            "/message/replyMessage",
            &[
                ("message_to", ann_id.as_str()),
                ("message_subject", "Beetle"),
                ("message_body", "Yes it is."),
            ],
            Some(&bob),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let reply = inbox.app.store.messages().last().unwrap().clone();
    assert_eq!(reply.to_account, inbox.ann.account_id);
    assert_eq!(reply.from_account, inbox.bob.account_id);
}
