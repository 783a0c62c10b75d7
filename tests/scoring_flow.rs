//! End-to-end scoring and incentive flow over the library API
//!
//! Tests the full path a user takes:
//! - Reference answers generated for a seeded question
//! - Scored answer accepted, rewarded and unlocking the question
//! - Earned points spent on a new question and on a paid unlock
//! - Deferred answers scored by the queue

use std::sync::Arc;
use std::time::Duration;

use tokio_test::assert_ok;

use ideamesh::{
    answers::AnswerService,
    auth::Identity,
    config::ProviderKind,
    ledger::IncentiveLedger,
    model::NewQuestion,
    provider::{MockProvider, ProviderRegistry},
    references::{ReferenceGenerator, ReferenceTarget},
    scoring::{QueueConfig, Scorer, ScoringQueue, ScoringService},
    store::{MemoryStore, Store},
    unlock::UnlockGate,
};

struct World {
    store: Arc<MemoryStore>,
    references: ReferenceGenerator,
    scoring: ScoringService,
    answers: AnswerService,
    unlocks: UnlockGate,
    ledger: IncentiveLedger,
    queue: ScoringQueue,
}

fn world(kimi: MockProvider, minimax: MockProvider) -> World {
    let store = Arc::new(MemoryStore::new());
    let providers = ProviderRegistry::new(ProviderKind::Kimi)
        .with_provider(ProviderKind::Kimi, Arc::new(kimi))
        .with_provider(ProviderKind::Minimax, Arc::new(minimax));

    let ledger = IncentiveLedger::new(store.clone());
    let scorer = Scorer::new(store.clone(), providers.clone());
    let queue = ScoringQueue::start(QueueConfig::default(), scorer.clone(), store.clone());

    World {
        references: ReferenceGenerator::new(store.clone(), providers),
        scoring: ScoringService::new(scorer, store.clone(), ledger.clone()),
        answers: AnswerService::new(store.clone(), ledger.clone(), queue.clone()),
        unlocks: UnlockGate::new(store.clone(), ledger.clone()),
        ledger,
        queue,
        store,
    }
}

fn travel_question() -> NewQuestion {
    NewQuestion {
        title: "第一次去桂林".into(),
        body: "桂林三天怎么玩比较好？".into(),
        main_category: "旅行".into(),
        sub_category: "国内".into(),
    }
}

/// Kimi writes references and judges; MiniMax writes references and judges reasonableness
fn judging_providers() -> (MockProvider, MockProvider) {
    let kimi = MockProvider::new("Kimi")
        .when("相似度", "0.2")
        .when("合理性", "0.8")
        .with_response("坐船游漓江，去阳朔西街");
    let minimax = MockProvider::new("MiniMax")
        .when("合理性", "0.6")
        .with_response("吃桂林米粉");
    (kimi, minimax)
}

#[tokio::test]
async fn test_answer_earn_and_spend() {
    let (kimi, minimax) = judging_providers();
    let w = world(kimi, minimax);
    let qid = w.store.insert_question(travel_question(), None).await.unwrap();

    // Seed reference answers from both providers
    let alice = Identity::user("alice");
    let generated = assert_ok!(
        w.references
            .generate(&alice, ReferenceTarget::Category("旅行".into()))
            .await
    );
    assert_eq!(generated.question_id, qid);
    assert_eq!(generated.reference_ids.len(), 2);

    // Alice answers well: uniqueness 0.8, reasonableness 0.7
    let outcome = w
        .scoring
        .score_and_create_answer(&alice, &qid, "包车去龙脊梯田看日出")
        .await
        .unwrap();
    assert!(outcome.accepted);
    assert!((outcome.uniqueness_rating - 0.8).abs() < 1e-9);
    assert!((outcome.reasonableness_rating - 0.7).abs() < 1e-9);
    assert_eq!(w.ledger.get(&alice).await.unwrap(), 10);

    let listing = w.answers.answers_for_question(&alice, &qid).await.unwrap();
    assert!(listing.is_unlocked);
    assert_eq!(listing.answers.len(), 1);

    // Alice spends her points on a new question (reasonableness 0.7 > 0.5)
    let created = w
        .scoring
        .score_and_create_question(
            &alice,
            NewQuestion {
                title: "阳朔住哪里".into(),
                body: "西街附近还是遇龙河边？".into(),
                main_category: "旅行".into(),
                sub_category: "国内".into(),
            },
        )
        .await
        .unwrap();
    assert!(created.success, "{}", created.message);
    assert_eq!(w.ledger.get(&alice).await.unwrap(), 0);

    // A second question is unaffordable and leaves the balance alone
    let refused = w
        .scoring
        .score_and_create_question(&alice, travel_question())
        .await
        .unwrap();
    assert!(!refused.success);
    assert!(refused.message.contains("short by 10"));
    assert_eq!(w.ledger.get(&alice).await.unwrap(), 0);
}

#[tokio::test]
async fn test_paid_unlock_for_a_reader() {
    let (kimi, minimax) = judging_providers();
    let w = world(kimi, minimax);
    let qid = w.store.insert_question(travel_question(), None).await.unwrap();

    let bob = Identity::user("bob");
    let listing = w.answers.answers_for_question(&bob, &qid).await.unwrap();
    assert!(!listing.is_unlocked);

    w.ledger.increase("bob", 4).await.unwrap();
    let short = w.unlocks.unlock_with_incentive(&bob, &qid).await.unwrap();
    assert!(!short.success);
    assert_eq!(
        short.message,
        "Insufficient incentive points. Need 5, you have 4 (short by 1)."
    );

    w.ledger.increase("bob", 1).await.unwrap();
    let paid = w.unlocks.unlock_with_incentive(&bob, &qid).await.unwrap();
    assert!(paid.success);
    assert_eq!(paid.balance, Some(0));
    assert!(w.unlocks.is_unlocked(&bob, &qid).await.unwrap());

    let again = w.unlocks.unlock_with_incentive(&bob, &qid).await.unwrap();
    assert_eq!(again.message, "Question already unlocked");
    assert_eq!(w.store.unlock_count(), 1);
}

#[tokio::test]
async fn test_deferred_answer_gets_ratings() {
    let (kimi, minimax) = judging_providers();
    let w = world(kimi, minimax);
    let qid = w.store.insert_question(travel_question(), None).await.unwrap();
    let carol = Identity::user("carol");
    assert_ok!(
        w.references
            .generate(&carol, ReferenceTarget::Question(qid.clone()))
            .await
    );

    let answer_id = assert_ok!(w.answers.create_answer(&carol, &qid, "骑电动车沿遇龙河").await);

    // Stored, rewarded and unlocked before any scoring happens
    assert_eq!(w.ledger.get(&carol).await.unwrap(), 10);
    assert!(w.unlocks.is_unlocked(&carol, &qid).await.unwrap());

    let mut rated = None;
    for _ in 0..200 {
        let answer = w.answers.get_answer(&answer_id).await.unwrap();
        if answer.uniqueness_rating.is_some() {
            rated = Some(answer);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let answer = rated.expect("queued job should rate the answer");
    assert!((answer.uniqueness_rating.unwrap() - 0.8).abs() < 1e-9);
    assert!((answer.reasonableness_rating.unwrap() - 0.7).abs() < 1e-9);

    // Re-running the job rewrites the same ratings
    let ratings = w.queue.process(&answer_id).await.unwrap().unwrap();
    assert!((ratings.uniqueness - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_provider_outage_degrades_to_zero() {
    let w = world(MockProvider::new("Kimi").failing(), MockProvider::new("MiniMax").failing());
    let qid = w.store.insert_question(travel_question(), None).await.unwrap();
    w.store
        .insert_ai_answer(ideamesh::model::NewAiAnswer {
            question_id: qid.clone(),
            content: "坐船".into(),
            ai_name: "Kimi".into(),
        })
        .await
        .unwrap();

    let outcome = w
        .scoring
        .score_and_create_answer(&Identity::user("dave"), &qid, "随便")
        .await
        .unwrap();
    assert!(!outcome.accepted);
    assert_eq!(outcome.uniqueness_rating, 0.0);
    assert_eq!(outcome.reasonableness_rating, 0.0);
    assert!(w.store.answers_for_question(&qid).await.unwrap().is_empty());
}
