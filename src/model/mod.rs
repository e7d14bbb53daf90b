pub mod parcel;
pub mod truck;
