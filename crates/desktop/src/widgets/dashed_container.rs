use iced::advanced::graphics::geometry;
use iced::advanced::layout;
use iced::advanced::renderer;
use iced::advanced::widget::tree::Tree;
use iced::advanced::widget::Widget;
use iced::advanced::{Clipboard, Layout, Renderer as _, Shell};
use iced::border::Border;
use iced::widget::canvas::{self, Frame, Path, Stroke};
use iced::{
    alignment, Color, Element, Event, Length, Padding, Point, Rectangle, Renderer, Size, Theme,
};

#[derive(Debug, Clone, Copy)]
pub struct DashedBorderStyle {
    pub border_color: Color,
    pub border_width: f32,
    pub dash_length: f32,
    pub gap_length: f32,
    pub corner_radius: f32,
    pub background: Color,
}

/// Fills the available space, centers its child, and strokes a dashed
/// border around the whole area. Used as the preview surface.
pub struct DashedContainer<'a, Message> {
    content: Element<'a, Message>,
    style: DashedBorderStyle,
    padding: Padding,
    min_height: f32,
}

impl<'a, Message> DashedContainer<'a, Message> {
    pub fn new(
        style: DashedBorderStyle,
        padding: impl Into<Padding>,
        content: impl Into<Element<'a, Message>>,
    ) -> Self {
        Self {
            content: content.into(),
            style,
            padding: padding.into(),
            min_height: 0.0,
        }
    }

    pub fn min_height(mut self, min_height: f32) -> Self {
        self.min_height = min_height;
        self
    }
}

impl<Message> Widget<Message, Theme, Renderer> for DashedContainer<'_, Message> {
    fn children(&self) -> Vec<Tree> {
        vec![Tree::new(&self.content)]
    }

    fn diff(&self, tree: &mut Tree) {
        tree.diff_children(std::slice::from_ref(&self.content));
    }

    fn size(&self) -> Size<Length> {
        Size {
            width: Length::Fill,
            height: Length::Fill,
        }
    }

    fn layout(
        &mut self,
        tree: &mut Tree,
        renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        let limits = limits.min_height(self.min_height);
        layout::positioned(
            &limits,
            Length::Fill,
            Length::Fill,
            self.padding,
            |limits| {
                self.content.as_widget_mut().layout(
                    &mut tree.children[0],
                    renderer,
                    &limits.loose(),
                )
            },
            |content, size| {
                content.align(
                    alignment::Alignment::Center,
                    alignment::Alignment::Center,
                    size,
                )
            },
        )
    }

    fn update(
        &mut self,
        tree: &mut Tree,
        event: &Event,
        layout: Layout<'_>,
        cursor: iced::mouse::Cursor,
        renderer: &Renderer,
        clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, Message>,
        viewport: &Rectangle,
    ) {
        let Some(content_layout) = layout.children().next() else {
            return;
        };
        self.content.as_widget_mut().update(
            &mut tree.children[0],
            event,
            content_layout,
            cursor,
            renderer,
            clipboard,
            shell,
            viewport,
        );
    }

    fn mouse_interaction(
        &self,
        tree: &Tree,
        layout: Layout<'_>,
        cursor: iced::mouse::Cursor,
        viewport: &Rectangle,
        renderer: &Renderer,
    ) -> iced::mouse::Interaction {
        layout
            .children()
            .next()
            .map(|content_layout| {
                self.content.as_widget().mouse_interaction(
                    &tree.children[0],
                    content_layout,
                    cursor,
                    viewport,
                    renderer,
                )
            })
            .unwrap_or_default()
    }

    fn draw(
        &self,
        tree: &Tree,
        renderer: &mut Renderer,
        theme: &Theme,
        renderer_style: &renderer::Style,
        layout: Layout<'_>,
        cursor: iced::mouse::Cursor,
        viewport: &Rectangle,
    ) {
        let bounds = layout.bounds();
        let Some(clipped_viewport) = bounds.intersection(viewport) else {
            return;
        };
        let s = self.style;

        renderer.fill_quad(
            renderer::Quad {
                bounds,
                border: Border {
                    radius: s.corner_radius.into(),
                    ..Border::default()
                },
                ..renderer::Quad::default()
            },
            s.background,
        );

        if let Some(content_layout) = layout.children().next() {
            self.content.as_widget().draw(
                &tree.children[0],
                renderer,
                theme,
                renderer_style,
                content_layout,
                cursor,
                &clipped_viewport,
            );
        }

        let mut frame = Frame::new(renderer, bounds.size());
        let inset = s.border_width / 2.0;
        let border_path = Path::rounded_rectangle(
            Point::new(inset, inset),
            Size::new(
                bounds.width - s.border_width,
                bounds.height - s.border_width,
            ),
            s.corner_radius.into(),
        );
        let dash_pattern = [s.dash_length, s.gap_length];
        frame.stroke(
            &border_path,
            Stroke {
                style: canvas::Style::Solid(s.border_color),
                width: s.border_width,
                line_dash: canvas::LineDash {
                    segments: &dash_pattern,
                    offset: 0,
                },
                ..Stroke::default()
            },
        );

        let geom = frame.into_geometry();
        renderer.with_translation(iced::Vector::new(bounds.x, bounds.y), |renderer| {
            geometry::Renderer::draw_geometry(renderer, geom);
        });
    }
}

impl<'a, Message: 'a> From<DashedContainer<'a, Message>> for Element<'a, Message> {
    fn from(container: DashedContainer<'a, Message>) -> Self {
        Element::new(container)
    }
}

pub fn dashed_container<'a, Message: 'a>(
    style: DashedBorderStyle,
    padding: impl Into<Padding>,
    content: impl Into<Element<'a, Message>>,
) -> DashedContainer<'a, Message> {
    DashedContainer::new(style, padding, content)
}
