use shared::{ChangeKind, ClassListResponse, ClassResponse, CreateClassRequest, SchoolClass, UpdateClassRequest};
use std::sync::Arc;
use tracing::{info, warn};

use super::change_feed::{tables, ChangeFeed};
use super::error::{SchoolError, SchoolResult};
use super::validation::{non_negative_amount, now_timestamp, optional, required};
use crate::storage::{ClassStorage, StudentStorage};

#[derive(Clone)]
pub struct ClassService {
    classes: Arc<dyn ClassStorage>,
    students: Arc<dyn StudentStorage>,
    feed: ChangeFeed,
}

impl ClassService {
    pub fn new(classes: Arc<dyn ClassStorage>, students: Arc<dyn StudentStorage>, feed: ChangeFeed) -> Self {
        Self { classes, students, feed }
    }

    pub async fn create_class(&self, owner_id: &str, request: CreateClassRequest) -> SchoolResult<ClassResponse> {
        info!("Creating class: name={}, section={:?}", request.name, request.section);

        let name = required("Class name", &request.name)?;
        let monthly_fee = non_negative_amount("Monthly fee", request.monthly_fee)?;

        let now = now_timestamp();
        let class = SchoolClass {
            id: SchoolClass::generate_id(),
            owner_id: owner_id.to_string(),
            name,
            section: optional(request.section),
            monthly_fee,
            created_at: now.clone(),
            updated_at: now,
        };

        self.classes.store_class(&class).await?;
        self.feed.publish(owner_id, tables::CLASSES, ChangeKind::Insert, &class.id);

        info!("Created class {} with ID: {}", class.display_name(), class.id);
        Ok(ClassResponse {
            success_message: format!("Class '{}' created successfully", class.display_name()),
            class,
        })
    }

    pub async fn get_class(&self, owner_id: &str, class_id: &str) -> SchoolResult<SchoolClass> {
        self.classes
            .get_class(owner_id, class_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Class", class_id))
    }

    pub async fn list_classes(&self, owner_id: &str) -> SchoolResult<ClassListResponse> {
        let classes = self.classes.list_classes(owner_id).await?;
        info!("Found {} classes", classes.len());
        Ok(ClassListResponse { classes })
    }

    pub async fn update_class(
        &self,
        owner_id: &str,
        class_id: &str,
        request: UpdateClassRequest,
    ) -> SchoolResult<ClassResponse> {
        info!("Updating class: {}", class_id);

        let mut class = self.get_class(owner_id, class_id).await?;

        if let Some(name) = request.name {
            class.name = required("Class name", &name)?;
        }
        if request.section.is_some() {
            class.section = optional(request.section);
        }
        if let Some(fee) = request.monthly_fee {
            class.monthly_fee = non_negative_amount("Monthly fee", fee)?;
        }
        class.updated_at = now_timestamp();

        if !self.classes.update_class(&class).await? {
            return Err(SchoolError::not_found("Class", class_id));
        }
        self.feed.publish(owner_id, tables::CLASSES, ChangeKind::Update, &class.id);

        Ok(ClassResponse {
            success_message: format!("Class '{}' updated successfully", class.display_name()),
            class,
        })
    }

    /// Refused while any student is still enrolled in the class
    pub async fn delete_class(&self, owner_id: &str, class_id: &str) -> SchoolResult<String> {
        info!("Deleting class: {}", class_id);

        let class = self.get_class(owner_id, class_id).await?;
        let enrolled = self.students.count_students_in_class(owner_id, class_id).await?;
        if enrolled > 0 {
            warn!("Refusing to delete class {} with {} students", class_id, enrolled);
            return Err(SchoolError::Conflict(format!(
                "Class '{}' still has {} student(s); move or remove them first",
                class.display_name(),
                enrolled
            )));
        }

        self.classes.delete_class(owner_id, class_id).await?;
        self.feed.publish(owner_id, tables::CLASSES, ChangeKind::Delete, class_id);

        Ok(format!("Class '{}' deleted successfully", class.display_name()))
    }
}
