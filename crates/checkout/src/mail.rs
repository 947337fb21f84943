//! Email templates for order notifications.

use domain::Order;

use crate::notifier::Mail;

fn payment_method_label(order: &Order) -> String {
    order.payment_method().as_str().replace('-', " ")
}

/// Builds the customer-facing confirmation for a placed order.
pub fn order_confirmation(order: &Order) -> Mail {
    let full_name = &order.billing().full_name;
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: auto; padding: 20px; border: 1px solid #eee; border-radius: 10px;">
  <h2 style="color: #2e86de;">Thank you for your order, {full_name}!</h2>
  <p>We've received your order and are preparing it for shipment.</p>
  <table style="width: 100%; border-collapse: collapse; margin-top: 20px;">
    <tr style="background-color: #f6f6f6;">
      <td style="padding: 10px;">Order ID:</td>
      <td style="padding: 10px;"><strong>{order_id}</strong></td>
    </tr>
    <tr>
      <td style="padding: 10px;">Total Amount:</td>
      <td style="padding: 10px;"><strong>{total}</strong></td>
    </tr>
    <tr style="background-color: #f6f6f6;">
      <td style="padding: 10px;">Payment Method:</td>
      <td style="padding: 10px;">{payment}</td>
    </tr>
    <tr>
      <td style="padding: 10px;">Shipping Address:</td>
      <td style="padding: 10px;">{address}</td>
    </tr>
  </table>
  <p style="margin-top: 20px;">We'll notify you once it's shipped. If you have questions, just reply to this email.</p>
  <p style="color: #999; font-size: 12px; margin-top: 40px;">SuperMart Team</p>
</div>"#,
        order_id = order.id(),
        total = order.total_price(),
        payment = payment_method_label(order),
        address = order.shipping_address(),
    );

    Mail {
        to: order.billing().email.clone(),
        subject: "Your Order Confirmation - SuperMart".to_string(),
        html,
    }
}

/// Builds the back-office alert for a newly placed order.
pub fn admin_alert(order: &Order, admin_email: &str) -> Mail {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: auto; padding: 20px; border: 1px solid #ddd; border-radius: 10px;">
  <h2 style="color: #e67e22;">New Order Placed</h2>
  <table style="width: 100%; border-collapse: collapse; margin-top: 20px;">
    <tr style="background-color: #f9f9f9;">
      <td style="padding: 10px;">Customer:</td>
      <td style="padding: 10px;"><strong>{full_name}</strong> ({email})</td>
    </tr>
    <tr>
      <td style="padding: 10px;">Order ID:</td>
      <td style="padding: 10px;">{order_id}</td>
    </tr>
    <tr style="background-color: #f9f9f9;">
      <td style="padding: 10px;">Payment Method:</td>
      <td style="padding: 10px;">{payment}</td>
    </tr>
    <tr>
      <td style="padding: 10px;">Total Amount:</td>
      <td style="padding: 10px;"><strong>{total}</strong></td>
    </tr>
  </table>
  <p style="margin-top: 20px;">Check the dashboard for more order details.</p>
  <p style="color: #aaa; font-size: 12px; margin-top: 40px;">SuperMart Order Notification</p>
</div>"#,
        full_name = order.billing().full_name,
        email = order.billing().email,
        order_id = order.id(),
        payment = payment_method_label(order),
        total = order.total_price(),
    );

    Mail {
        to: admin_email.to_string(),
        subject: "New Order Received - SuperMart".to_string(),
        html,
    }
}
