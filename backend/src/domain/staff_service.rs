use shared::{ChangeKind, CreateStaffRequest, Staff, UpdateStaffRequest};
use std::sync::Arc;
use tracing::{info, warn};

use super::change_feed::{tables, ChangeFeed};
use super::error::{SchoolError, SchoolResult};
use super::validation::{non_negative_amount, now_timestamp, optional, parse_date, required};
use crate::storage::{SalaryStorage, StaffStorage};

#[derive(Clone)]
pub struct StaffService {
    staff: Arc<dyn StaffStorage>,
    salaries: Arc<dyn SalaryStorage>,
    feed: ChangeFeed,
}

impl StaffService {
    pub fn new(staff: Arc<dyn StaffStorage>, salaries: Arc<dyn SalaryStorage>, feed: ChangeFeed) -> Self {
        Self { staff, salaries, feed }
    }

    pub async fn create_staff(&self, owner_id: &str, request: CreateStaffRequest) -> SchoolResult<Staff> {
        info!("Creating staff member: name={}, role={}", request.name, request.role);

        let name = required("Name", &request.name)?;
        let role = required("Role", &request.role)?;
        let monthly_salary = non_negative_amount("Monthly salary", request.monthly_salary)?;
        let join_date = parse_date("Join date", &request.join_date)?;

        let now = now_timestamp();
        let staff = Staff {
            id: Staff::generate_id(),
            owner_id: owner_id.to_string(),
            name,
            role,
            phone: optional(request.phone),
            monthly_salary,
            join_date: join_date.format("%Y-%m-%d").to_string(),
            photo_path: optional(request.photo_path),
            created_at: now.clone(),
            updated_at: now,
        };

        self.staff.store_staff(&staff).await?;
        self.feed.publish(owner_id, tables::STAFF, ChangeKind::Insert, &staff.id);
        Ok(staff)
    }

    pub async fn get_staff(&self, owner_id: &str, staff_id: &str) -> SchoolResult<Staff> {
        self.staff
            .get_staff(owner_id, staff_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Staff member", staff_id))
    }

    pub async fn list_staff(&self, owner_id: &str) -> SchoolResult<Vec<Staff>> {
        Ok(self.staff.list_staff(owner_id).await?)
    }

    pub async fn update_staff(&self, owner_id: &str, staff_id: &str, request: UpdateStaffRequest) -> SchoolResult<Staff> {
        info!("Updating staff member: {}", staff_id);

        let mut staff = self.get_staff(owner_id, staff_id).await?;
        if let Some(name) = request.name {
            staff.name = required("Name", &name)?;
        }
        if let Some(role) = request.role {
            staff.role = required("Role", &role)?;
        }
        if let Some(salary) = request.monthly_salary {
            staff.monthly_salary = non_negative_amount("Monthly salary", salary)?;
        }
        if let Some(date) = request.join_date {
            staff.join_date = parse_date("Join date", &date)?.format("%Y-%m-%d").to_string();
        }
        if request.phone.is_some() {
            staff.phone = optional(request.phone);
        }
        if request.photo_path.is_some() {
            staff.photo_path = optional(request.photo_path);
        }
        staff.updated_at = now_timestamp();

        if !self.staff.update_staff(&staff).await? {
            return Err(SchoolError::not_found("Staff member", staff_id));
        }
        self.feed.publish(owner_id, tables::STAFF, ChangeKind::Update, &staff.id);
        Ok(staff)
    }

    /// Removes the staff member and their salary history
    pub async fn delete_staff(&self, owner_id: &str, staff_id: &str) -> SchoolResult<String> {
        info!("Deleting staff member: {}", staff_id);

        let staff = self.get_staff(owner_id, staff_id).await?;
        let removed = self.salaries.delete_salaries_for_staff(owner_id, staff_id).await?;
        if removed > 0 {
            warn!("Removed {} salary record(s) of {}", removed, staff_id);
        }
        self.staff.delete_staff(owner_id, staff_id).await?;
        self.feed.publish(owner_id, tables::STAFF, ChangeKind::Delete, staff_id);

        Ok(format!("Staff member '{}' deleted successfully", staff.name))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::Repositories;

    pub(crate) fn request(name: &str, salary: f64, join_date: &str) -> CreateStaffRequest {
        CreateStaffRequest {
            name: name.to_string(),
            role: "Teacher".to_string(),
            phone: None,
            monthly_salary: salary,
            join_date: join_date.to_string(),
            photo_path: None,
        }
    }

    #[tokio::test]
    async fn test_staff_crud_and_validation() {
        let repos = Repositories::in_memory().await.unwrap();
        let service = StaffService::new(repos.staff.clone(), repos.salaries.clone(), ChangeFeed::new());

        assert!(matches!(
            service.create_staff("o", request("", 100.0, "2024-01-01")).await,
            Err(SchoolError::Validation(_))
        ));
        assert!(matches!(
            service.create_staff("o", request("Neha", -1.0, "2024-01-01")).await,
            Err(SchoolError::Validation(_))
        ));

        let staff = service.create_staff("o", request("Neha", 18000.0, "2024-01-01")).await.unwrap();
        assert!(staff.id.starts_with("staff::"));

        let updated = service
            .update_staff("o", &staff.id, UpdateStaffRequest { role: Some("Coordinator".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.role, "Coordinator");
        assert_eq!(updated.monthly_salary, 18000.0);

        assert!(matches!(service.get_staff("x", &staff.id).await, Err(SchoolError::NotFound(_))));
        service.delete_staff("o", &staff.id).await.unwrap();
        assert!(service.list_staff("o").await.unwrap().is_empty());
    }
}
