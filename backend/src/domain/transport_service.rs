use shared::{AssignTransportRequest, ChangeKind, CreateDriverRequest, Driver, Student, StudentResponse, UpdateDriverRequest};
use std::sync::Arc;
use tracing::info;

use super::change_feed::{tables, ChangeFeed};
use super::error::{SchoolError, SchoolResult};
use super::validation::{now_timestamp, optional, required};
use crate::storage::{DriverStorage, StudentStorage};

/// Drivers and which students ride with them
#[derive(Clone)]
pub struct TransportService {
    drivers: Arc<dyn DriverStorage>,
    students: Arc<dyn StudentStorage>,
    feed: ChangeFeed,
}

impl TransportService {
    pub fn new(drivers: Arc<dyn DriverStorage>, students: Arc<dyn StudentStorage>, feed: ChangeFeed) -> Self {
        Self { drivers, students, feed }
    }

    pub async fn create_driver(&self, owner_id: &str, request: CreateDriverRequest) -> SchoolResult<Driver> {
        info!("Creating driver: name={}, vehicle={}", request.name, request.vehicle_number);

        let driver = Driver {
            id: Driver::generate_id(),
            owner_id: owner_id.to_string(),
            name: required("Driver name", &request.name)?,
            phone: optional(request.phone),
            vehicle_number: required("Vehicle number", &request.vehicle_number)?,
            route: optional(request.route),
            created_at: now_timestamp(),
        };

        self.drivers.store_driver(&driver).await?;
        self.feed.publish(owner_id, tables::DRIVERS, ChangeKind::Insert, &driver.id);
        Ok(driver)
    }

    pub async fn get_driver(&self, owner_id: &str, driver_id: &str) -> SchoolResult<Driver> {
        self.drivers
            .get_driver(owner_id, driver_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Driver", driver_id))
    }

    pub async fn list_drivers(&self, owner_id: &str) -> SchoolResult<Vec<Driver>> {
        Ok(self.drivers.list_drivers(owner_id).await?)
    }

    pub async fn update_driver(&self, owner_id: &str, driver_id: &str, request: UpdateDriverRequest) -> SchoolResult<Driver> {
        info!("Updating driver: {}", driver_id);

        let mut driver = self.get_driver(owner_id, driver_id).await?;
        if let Some(name) = request.name {
            driver.name = required("Driver name", &name)?;
        }
        if let Some(vehicle) = request.vehicle_number {
            driver.vehicle_number = required("Vehicle number", &vehicle)?;
        }
        if request.phone.is_some() {
            driver.phone = optional(request.phone);
        }
        if request.route.is_some() {
            driver.route = optional(request.route);
        }

        if !self.drivers.update_driver(&driver).await? {
            return Err(SchoolError::not_found("Driver", driver_id));
        }
        self.feed.publish(owner_id, tables::DRIVERS, ChangeKind::Update, &driver.id);
        Ok(driver)
    }

    /// Deleting a driver leaves their students without transport
    pub async fn delete_driver(&self, owner_id: &str, driver_id: &str) -> SchoolResult<String> {
        info!("Deleting driver: {}", driver_id);

        let driver = self.get_driver(owner_id, driver_id).await?;
        let riders = self.students.list_students_by_driver(owner_id, driver_id).await?;
        let cleared = self.students.clear_driver_assignments(owner_id, driver_id).await?;
        for student in &riders {
            self.feed.publish(owner_id, tables::STUDENTS, ChangeKind::Update, &student.id);
        }

        self.drivers.delete_driver(owner_id, driver_id).await?;
        self.feed.publish(owner_id, tables::DRIVERS, ChangeKind::Delete, driver_id);

        info!("Deleted driver {} and unassigned {} student(s)", driver_id, cleared);
        Ok(format!("Driver '{}' deleted successfully", driver.name))
    }

    pub async fn students_for_driver(&self, owner_id: &str, driver_id: &str) -> SchoolResult<Vec<Student>> {
        self.get_driver(owner_id, driver_id).await?;
        Ok(self.students.list_students_by_driver(owner_id, driver_id).await?)
    }

    pub async fn assign_student(
        &self,
        owner_id: &str,
        student_id: &str,
        request: AssignTransportRequest,
    ) -> SchoolResult<StudentResponse> {
        info!("Assigning student {} to driver {}", student_id, request.driver_id);

        let driver = self.get_driver(owner_id, request.driver_id.trim()).await?;
        let mut student = self.load_student(owner_id, student_id).await?;
        student.transport_driver_id = Some(driver.id.clone());
        self.save(&mut student).await?;

        Ok(StudentResponse {
            success_message: format!("{} assigned to {}", student.name, driver.name),
            student,
        })
    }

    pub async fn unassign_student(&self, owner_id: &str, student_id: &str) -> SchoolResult<StudentResponse> {
        info!("Removing transport for student {}", student_id);

        let mut student = self.load_student(owner_id, student_id).await?;
        student.transport_driver_id = None;
        self.save(&mut student).await?;

        Ok(StudentResponse {
            success_message: format!("Transport removed for {}", student.name),
            student,
        })
    }

    async fn load_student(&self, owner_id: &str, student_id: &str) -> SchoolResult<Student> {
        self.students
            .get_student(owner_id, student_id)
            .await?
            .ok_or_else(|| SchoolError::not_found("Student", student_id))
    }

    async fn save(&self, student: &mut Student) -> SchoolResult<()> {
        student.updated_at = now_timestamp();
        if !self.students.update_student(student).await? {
            return Err(SchoolError::not_found("Student", &student.id));
        }
        self.feed.publish(&student.owner_id, tables::STUDENTS, ChangeKind::Update, &student.id);
        Ok(())
    }
}
