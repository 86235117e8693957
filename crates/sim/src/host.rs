use guessfire_shared::RobotSnapshot;

/// What the gunner needs from the simulation hosting it. Commands are
/// requests for the current tick; the host applies them when it advances.
pub trait Host {
    fn snapshot(&self) -> RobotSnapshot;

    /// Start turning the gun toward an absolute bearing.
    fn turn_gun_to(&mut self, bearing: f64);

    /// Start turning the radar toward an absolute bearing.
    fn turn_radar_to(&mut self, bearing: f64);

    /// Fire at `power`. Succeeds only when the gun is cool; returns whether
    /// a bullet left.
    fn fire(&mut self, power: f64) -> bool;

    /// Turn the body by a relative angle.
    fn turn_body(&mut self, radians: f64);

    /// Move along the body heading; negative values back up.
    fn ahead(&mut self, distance: f64);
}
