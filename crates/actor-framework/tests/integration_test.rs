use actor_framework::{ActorEntity, FrameworkError, ResourceActor};
use async_trait::async_trait;

// --- Test Entity ---

#[derive(Clone, Debug, PartialEq)]
struct Voucher {
    code: String,
    balance: u32,
    redeemed_by: Option<u64>,
}

#[derive(Debug)]
struct VoucherCreate {
    balance: u32,
}

#[derive(Debug)]
struct VoucherUpdate {
    balance: Option<u32>,
}

#[derive(Debug)]
enum VoucherAction {
    /// Compare-and-set: only the first redeemer wins.
    Redeem(u64),
}

#[derive(Debug, thiserror::Error)]
enum VoucherError {
    #[error("empty voucher")]
    Empty,
}

#[async_trait]
impl ActorEntity for Voucher {
    type Id = String;
    type Create = VoucherCreate;
    type Update = VoucherUpdate;
    type Action = VoucherAction;
    type ActionResult = bool;
    type Context = ();
    type Error = VoucherError;

    fn from_create_params(code: String, params: VoucherCreate) -> Result<Self, Self::Error> {
        if params.balance == 0 {
            return Err(VoucherError::Empty);
        }
        Ok(Self {
            code,
            balance: params.balance,
            redeemed_by: None,
        })
    }

    async fn on_update(
        &mut self,
        update: VoucherUpdate,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        if let Some(balance) = update.balance {
            self.balance = balance;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: VoucherAction,
        _ctx: &Self::Context,
    ) -> Result<bool, Self::Error> {
        match action {
            VoucherAction::Redeem(user) => {
                if self.redeemed_by.is_some() {
                    return Ok(false);
                }
                // Yield mid-action: the actor must still not interleave another request.
                tokio::task::yield_now().await;
                self.redeemed_by = Some(user);
                Ok(true)
            }
        }
    }
}

fn generated_codes() -> impl FnMut() -> String + Send + 'static {
    let mut next = 0u32;
    move || {
        next += 1;
        format!("V{next:04}")
    }
}

// --- Tests ---

#[tokio::test]
async fn test_framework_full_lifecycle() {
    let (actor, client) = ResourceActor::<Voucher>::new(10, generated_codes());
    let handle = tokio::spawn(actor.run(()));

    // 1. Create with a generated key
    let code = client.create(VoucherCreate { balance: 50 }).await.unwrap();
    assert_eq!(code, "V0001");

    // 2. Create with a caller-chosen key, then collide with it
    let promo = client
        .insert("PROMO".to_string(), VoucherCreate { balance: 10 })
        .await
        .unwrap();
    assert_eq!(promo, "PROMO");
    let dup = client
        .insert("PROMO".to_string(), VoucherCreate { balance: 99 })
        .await
        .unwrap_err();
    assert!(matches!(dup, FrameworkError::AlreadyExists(_)));

    // 3. Entity validation rejects the create and stores nothing
    let empty = client.create(VoucherCreate { balance: 0 }).await.unwrap_err();
    assert!(matches!(
        empty.entity_error::<VoucherError>(),
        Some(VoucherError::Empty)
    ));
    assert_eq!(client.list().await.unwrap().len(), 2);

    // 4. Action, then the same action loses
    assert!(client
        .perform_action(code.clone(), VoucherAction::Redeem(7))
        .await
        .unwrap());
    assert!(!client
        .perform_action(code.clone(), VoucherAction::Redeem(8))
        .await
        .unwrap());
    let voucher = client.get(code.clone()).await.unwrap().unwrap();
    assert_eq!(voucher.code, code);
    assert_eq!(voucher.redeemed_by, Some(7));

    // 5. Update
    let updated = client
        .update(code.clone(), VoucherUpdate { balance: Some(5) })
        .await
        .unwrap();
    assert_eq!(updated.balance, 5);

    // 6. Delete, and actions on missing keys report NotFound
    client.delete(code.clone()).await.unwrap();
    assert!(client.get(code.clone()).await.unwrap().is_none());
    let missing = client
        .perform_action(code, VoucherAction::Redeem(1))
        .await
        .unwrap_err();
    assert!(matches!(missing, FrameworkError::NotFound(_)));

    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_keyed_actor_requires_explicit_keys() {
    let (actor, client) = ResourceActor::<Voucher>::keyed(10);
    tokio::spawn(actor.run(()));

    let err = client.create(VoucherCreate { balance: 1 }).await.unwrap_err();
    assert!(matches!(err, FrameworkError::MissingId));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_actions_are_serialised() {
    let (actor, client) = ResourceActor::<Voucher>::keyed(64);
    tokio::spawn(actor.run(()));
    client
        .insert("GOLD".to_string(), VoucherCreate { balance: 1 })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for user in 0..50u64 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .perform_action("GOLD".to_string(), VoucherAction::Redeem(user))
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "exactly one redeem may win");
}

#[tokio::test]
async fn test_closed_actor_reports_disconnect() {
    let (actor, client) = ResourceActor::<Voucher>::keyed(1);
    drop(actor);

    let err = client.get("X".to_string()).await.unwrap_err();
    assert!(err.is_disconnected());
}
