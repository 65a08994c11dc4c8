//! ContractClient behaviour against the in-memory chain.

use std::sync::Arc;
use std::time::Duration;

use votebox_contract::{ClientError, ConfirmationPolicy, ContractClient, RemoteCallError};
use votebox_nullables::{Method, NullChain};
use votebox_types::codec::{decode_candidate, encode};
use votebox_types::{UserId, ValidationError};

const OWNER: UserId = UserId::new(1337);

fn fast() -> ConfirmationPolicy {
    ConfirmationPolicy {
        poll_interval: Duration::from_millis(1),
        timeout: Duration::from_secs(2),
    }
}

async fn deployed(names: &[&str]) -> (Arc<NullChain>, ContractClient<NullChain>) {
    let chain = Arc::new(NullChain::new());
    let blob = encode(names).expect("encodable");
    let client = ContractClient::create(Arc::clone(&chain), fast(), blob, OWNER)
        .await
        .expect("deployed");
    (chain, client)
}

#[tokio::test]
async fn create_binds_to_new_contract() {
    let (chain, client) = deployed(&["A", "B", "C"]).await;
    assert!(chain.is_alive(client.address()));
    assert_eq!(client.known_candidate_count(), 3);
    assert_eq!(client.candidate_count().await.unwrap(), 3);

    let names: Vec<String> = client
        .get_all_candidates()
        .await
        .unwrap()
        .iter()
        .map(|c| decode_candidate(c).unwrap())
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn out_of_range_index_never_reaches_the_node() {
    let (chain, client) = deployed(&["A", "B"]).await;
    let before = chain.total_requests();

    let err = client.get_candidate(2).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Validation(ValidationError::InvalidIndex { index: 2, count: 2 })
    );
    assert!(client.get_vote_count(u64::MAX).await.is_err());
    assert!(matches!(
        client.vote(UserId::new(5), 7).await,
        Err(ClientError::Validation(_))
    ));

    assert_eq!(chain.total_requests(), before);
}

#[tokio::test]
async fn vote_is_confirmed_before_returning() {
    let (chain, client) = deployed(&["A", "B"]).await;
    chain.set_receipt_delay(3);

    client.vote(UserId::new(0), 1).await.unwrap();

    assert!(chain.request_count(Method::TransactionReceipt) >= 4);
    assert_eq!(client.get_vote_count(1).await.unwrap(), 1);
    assert!(client.has_voted(UserId::new(0)).await.unwrap());
    assert!(!client.has_voted(UserId::new(1)).await.unwrap());
}

#[tokio::test]
async fn double_vote_comes_back_as_revert() {
    let (_chain, client) = deployed(&["A", "B"]).await;
    client.vote(UserId::new(0), 0).await.unwrap();

    match client.vote(UserId::new(0), 0).await {
        Err(ClientError::Remote(RemoteCallError::Reverted { .. })) => {}
        other => panic!("expected revert, got {other:?}"),
    }
    let tally = client.get_candidates_and_votes().await.unwrap();
    assert_eq!(tally.iter().map(|(_, v)| *v).collect::<Vec<_>>(), vec![1, 0]);
}

#[tokio::test]
async fn kill_by_non_owner_sends_nothing() {
    let (chain, client) = deployed(&["A"]).await;
    let sends = chain.request_count(Method::SendTransaction);

    assert!(!client.kill(UserId::new(1)).await.unwrap());

    assert_eq!(chain.request_count(Method::SendTransaction), sends);
    assert!(chain.is_alive(client.address()));
}

#[tokio::test]
async fn kill_by_owner_destroys_contract() {
    let (chain, client) = deployed(&["A"]).await;

    assert!(client.kill(OWNER).await.unwrap());

    assert!(!chain.is_alive(client.address()));
    assert!(ContractClient::restore(Arc::clone(&chain), fast(), client.address())
        .await
        .is_none());
    // stale handle fails cleanly instead of answering from local state
    assert!(client.get_all_candidates().await.unwrap_err().is_destroyed());
    assert!(client.has_voted(UserId::new(0)).await.unwrap_err().is_destroyed());
    assert!(client.owner().await.unwrap_err().is_destroyed());
}

#[tokio::test]
async fn vote_on_destroyed_contract_is_not_reported_as_cast() {
    let (chain, client) = deployed(&["A", "B"]).await;
    let stale = client.clone();
    assert!(client.kill(OWNER).await.unwrap());

    // the node mines the transaction as a plain transfer
    match stale.vote(UserId::new(4), 1).await {
        Err(ClientError::Remote(RemoteCallError::NoCode { address })) => {
            assert_eq!(address, stale.address());
        }
        other => panic!("expected missing code, got {other:?}"),
    }
    assert!(!chain.is_alive(stale.address()));
}

#[tokio::test]
async fn vote_racing_a_kill_is_not_reported_as_cast() {
    let (chain, client) = deployed(&["A", "B"]).await;
    chain.destroy_before_next_send(client.address());

    let err = client.vote(UserId::new(4), 0).await.unwrap_err();

    assert!(err.is_destroyed());
    assert_eq!(chain.request_count(Method::SendTransaction), 2);
}

#[tokio::test]
async fn deployment_is_checked_against_reported_count() {
    let (chain, client) = deployed(&["A", "B", "C"]).await;
    assert_eq!(client.known_candidate_count(), 3);
    // the count read-back is the only call made while creating
    assert_eq!(chain.request_count(Method::Call), 1);
    assert_eq!(chain.request_count(Method::CodeAt), 0);
}

#[tokio::test]
async fn restore_requires_code() {
    let chain = Arc::new(NullChain::new());
    assert!(
        ContractClient::restore(Arc::clone(&chain), fast(), chain.plain_account())
            .await
            .is_none()
    );

    let address = chain.deploy_directly(&["X", "Y"], OWNER);
    let client = ContractClient::restore(Arc::clone(&chain), fast(), address)
        .await
        .expect("live contract");
    assert_eq!(client.known_candidate_count(), 2);
    assert_eq!(client.owner().await.unwrap(), OWNER);
}

#[tokio::test]
async fn one_failed_read_fails_the_whole_list() {
    let (chain, client) = deployed(&["A", "B", "C"]).await;
    chain.fail_next(1);
    assert!(client.get_all_candidates().await.is_err());
    assert_eq!(client.get_all_candidates().await.unwrap().len(), 3);
}

#[tokio::test]
async fn failed_deployment_yields_nothing() {
    let chain = Arc::new(NullChain::new());
    chain.fail_next_sends(1);
    let blob = encode(&["A"]).unwrap();
    assert!(ContractClient::create(chain, fast(), blob, OWNER).await.is_none());
}

#[tokio::test]
async fn confirmation_times_out() {
    let (chain, client) = deployed(&["A"]).await;
    chain.set_receipt_delay(u32::MAX);
    let restored = ContractClient::restore(
        Arc::clone(&chain),
        ConfirmationPolicy {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(20),
        },
        client.address(),
    )
    .await
    .unwrap();

    match restored.vote(UserId::new(3), 0).await {
        Err(ClientError::Remote(RemoteCallError::ConfirmationTimeout { .. })) => {}
        other => panic!("expected timeout, got {other:?}"),
    }
}
