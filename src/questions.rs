//! Question queries

use std::sync::Arc;

use crate::model::{AiAnswer, Question};
use crate::store::Store;
use crate::types::{IdeaMeshError, Result};

#[derive(Clone)]
pub struct QuestionService {
    store: Arc<dyn Store>,
}

impl QuestionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get_question(&self, id: &str) -> Result<Question> {
        self.store
            .get_question(id)
            .await?
            .ok_or_else(|| IdeaMeshError::NotFound("Question not found".into()))
    }

    pub async fn questions_by_category(&self, main_category: &str) -> Result<Vec<Question>> {
        self.store.questions_by_category(main_category).await
    }

    /// Title and body keyword search; blank keywords match nothing
    pub async fn search_questions(&self, keyword: &str) -> Result<Vec<Question>> {
        self.store.search_questions(keyword).await
    }

    pub async fn ai_answers(&self, question_id: &str) -> Result<Vec<AiAnswer>> {
        self.store.ai_answers_for_question(question_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{new_id, NewQuestion};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_get_missing_question() {
        let service = QuestionService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            service.get_question(&new_id()).await,
            Err(IdeaMeshError::NotFound(_))
        ));
        assert!(matches!(
            service.get_question("zzz").await,
            Err(IdeaMeshError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_search_many_matches_capped_per_field() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..12 {
            store
                .insert_question(
                    NewQuestion {
                        title: format!("火锅 {}", i),
                        body: if i < 3 { "无关".into() } else { "火锅店推荐".into() },
                        main_category: "美食".into(),
                        sub_category: "川菜".into(),
                    },
                    None,
                )
                .await
                .unwrap();
        }
        let service = QuestionService::new(store);
        let hits = service.search_questions("火锅").await.unwrap();

        // Up to 10 title hits plus body-only hits, without duplicates
        let mut ids: Vec<_> = hits.iter().map(|q| q.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), hits.len());
        assert!(hits.len() <= 20);
        assert!(hits.len() >= 10);
    }
}
