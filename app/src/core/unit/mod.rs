mod ampere;
mod kwh;
mod volt;
mod watt;

pub use ampere::Ampere;
pub use kwh::KiloWattHours;
pub use volt::Volt;
pub use watt::Watt;

impl std::ops::Mul<Ampere> for Volt {
    type Output = Watt;

    fn mul(self, rhs: Ampere) -> Self::Output {
        Watt(self.0 * rhs.0)
    }
}
