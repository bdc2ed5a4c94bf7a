//! End-to-end wizard scenarios: scene engine + codec + crypto + vault
//! working together the way the bot drives them.

use safecore::callback::{Callback, CallbackError, MAX_CALLBACK_BYTES};
use safecore::scene::{SceneKind, SceneManager, SceneValue, Step};
use safecore::security::{AuthService, CryptoService};
use safecore::storage::vault::NewPassword;
use safecore::storage::{MemoryVault, Vault};

const USER: i64 = 42;

#[tokio::test]
async fn save_password_wizard_persists_encrypted_bundle() {
    let scenes = SceneManager::new();
    let crypto = CryptoService::new("integration-test-key").unwrap();
    let vault = MemoryVault::new();
    let auth = AuthService::new();

    // Register + login
    let hash = auth.hash_master_password("M@ster123").unwrap();
    let user = vault.create_user(USER, &hash).await.unwrap();
    assert!(auth.verify_master_password("M@ster123", &user.master_password_hash));

    // Drive the wizard: service → skip username → password → skip tags
    assert_eq!(scenes.start(USER, SceneKind::SavePassword), Step::ServiceName);
    scenes.record_and_advance(USER, "service_name", SceneValue::Text("GitHub".into()));
    scenes.record_and_advance(USER, "username", SceneValue::Text(String::new()));
    scenes.record_and_advance(USER, "password", SceneValue::Text("Str0ng!Pass".into()));
    let step = scenes.record_and_advance(USER, "tags", SceneValue::Tags(vec![]));
    assert_eq!(step, Some(Step::Confirm));

    // Confirm: hand the bundle to the vault, encrypted
    let data = scenes.complete(USER).unwrap();
    let service = data["service_name"].as_text().unwrap().to_string();
    let username = data["username"].as_text().unwrap();
    let password = data["password"].as_text().unwrap();
    let tags: Vec<String> = data["tags"].as_tags().unwrap().to_vec();

    let entry = vault
        .save_password(
            user.id,
            NewPassword {
                service_name: service.clone(),
                encrypted_username: crypto.encrypt(username).unwrap(),
                encrypted_password: crypto.encrypt(password).unwrap(),
                tags,
            },
        )
        .await
        .unwrap();

    // Scene is gone; stored fields decrypt back to the collected input
    assert!(scenes.complete(USER).is_none());
    assert_eq!(entry.service_name, "GitHub");
    assert_eq!(entry.encrypted_username, "");
    assert_ne!(entry.encrypted_password, "Str0ng!Pass");
    assert_eq!(crypto.decrypt(&entry.encrypted_password).unwrap(), "Str0ng!Pass");

    let listed = vault.get_passwords(user.id, Some("git")).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn starting_a_second_wizard_discards_the_first() {
    let scenes = SceneManager::new();
    scenes.start(USER, SceneKind::SavePassword);
    scenes.record_and_advance(USER, "service_name", SceneValue::Text("Gmail".into()));

    scenes.start(USER, SceneKind::AddTask);
    assert!(scenes.has_active(USER));
    assert_eq!(scenes.kind_of(USER), Some(SceneKind::AddTask));
    assert_eq!(scenes.get_data(USER, "service_name"), None);
}

#[test]
fn skip_via_button_and_text_store_the_same_value() {
    // Both input channels resolve to the same set_data + advance contract:
    // storing the skip default and moving on.
    let scenes = SceneManager::new();

    scenes.start(USER, SceneKind::SavePassword);
    scenes.advance(USER); // at username
    let via_button = scenes.record_and_advance(USER, "username", SceneValue::Text(String::new()));

    let other_user = USER + 1;
    scenes.start(other_user, SceneKind::SavePassword);
    scenes.advance(other_user);
    let via_text = scenes.record_and_advance(other_user, "username", SceneValue::Text(String::new()));

    assert_eq!(via_button, via_text);
    assert_eq!(scenes.get_data(USER, "username"), scenes.get_data(other_user, "username"));
}

#[test]
fn every_item_button_for_a_uuid_id_fits_the_budget() {
    // UUIDs are the longest field routinely packed into buttons; every
    // action family must fit the platform limit with room to spare.
    let id = "550e8400-e29b-41d4-a716-446655440000".to_string();
    let buttons = vec![
        Callback::PasswordView { id: id.clone() },
        Callback::PasswordCopy { id: id.clone() },
        Callback::PasswordEdit { id: id.clone() },
        Callback::PasswordDelete { id: id.clone() },
        Callback::TaskView { id: id.clone() },
        Callback::TaskDelete { id: id.clone() },
        Callback::TaskStatus {
            id: id.clone(),
            status: safecore::storage::TaskStatus::InProgress,
        },
        Callback::FileView { id: id.clone() },
        Callback::FileDownload { id: id.clone() },
        Callback::FileShare { id: id.clone() },
        Callback::FileDelete { id },
    ];
    for button in buttons {
        let token = button.encode().unwrap();
        assert!(token.len() <= MAX_CALLBACK_BYTES, "over budget: {}", token);
        assert_eq!(Callback::decode(&token), button);
    }
}

#[test]
fn oversized_payloads_fail_encoding_instead_of_truncating() {
    let cb = Callback::FileDownload { id: "f".repeat(80) };
    assert!(matches!(cb.encode(), Err(CallbackError::Budget(_))));
}

#[test]
fn decoding_garbage_never_panics() {
    let long = "x".repeat(500);
    for garbage in ["", ":", "::::", "🤖", "pv", "{\"a\":1}", "task_status:id", long.as_str()] {
        let _ = Callback::decode(garbage);
    }
    assert_eq!(Callback::decode("🤖"), Callback::Error);
}
